use anyhow::Context;
use hypehold::orchestration::{AnalysisOutcome, Analyzer, BatchScreener};
use hypehold::report::{render_analysis, render_batch_summary};
use hypehold::watchlist::{load_address_list, Blacklist};
use hypehold::{api, Config, DataSource, HyperliquidDataSource, RunMode};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let datasource: Arc<dyn DataSource> =
        Arc::new(HyperliquidDataSource::new(config.hyperliquid_api_url.clone()));
    let analyzer = Arc::new(Analyzer::new(datasource, config.thresholds()));

    match config.run_mode {
        RunMode::Batch => run_batch(config, analyzer).await,
        RunMode::Serve => serve(config, analyzer).await,
    }
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

async fn run_batch(config: Config, analyzer: Arc<Analyzer>) -> anyhow::Result<()> {
    let list_path = config
        .address_list_file
        .as_deref()
        .context("ADDRESS_LIST_FILE is not set")?;
    let addresses = load_address_list(list_path)?;

    let blacklist = match config.blacklist_file.as_deref() {
        Some(path) => Blacklist::load(path)?,
        None => Blacklist::empty(),
    };
    tracing::info!(
        addresses = addresses.len(),
        blacklisted = blacklist.len(),
        "Loaded watchlist"
    );

    let screener = BatchScreener::new(analyzer.clone(), config.screen_concurrency);
    let report = screener.screen(addresses, &blacklist).await;

    for entry in &report.entries {
        match &entry.outcome {
            AnalysisOutcome::Analyzed(analysis) => {
                let full = config.show_full_stats && analysis.passes();
                println!(
                    "{}",
                    render_analysis(analysis, analyzer.thresholds(), full)
                );
            }
            AnalysisOutcome::NoData { user } => println!("{}: no fills found\n", user),
            AnalysisOutcome::Failed { user, error } => println!("{}: failed: {}\n", user, error),
        }
    }

    println!("{}", render_batch_summary(&report));

    if let Some(path) = config.report_csv_path.as_deref() {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path))?;
        report
            .write_qualified_csv(file)
            .with_context(|| format!("Failed to write {}", path))?;
        tracing::info!(path, qualified = report.qualified_count(), "Wrote CSV report");
    }

    Ok(())
}

async fn serve(config: Config, analyzer: Arc<Analyzer>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let app = api::create_router(api::AppState::new(analyzer));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_log_filter_honours_rust_log() {
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter(Some("hypehold=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }
}
