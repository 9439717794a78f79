use crate::datasource::{DataSource, DataSourceError};
use crate::domain::{Address, RawFill, TimeMs};
use crate::engine::classifier::{classify_all, count_by_class};
use crate::engine::{
    evaluate, InsufficientDataWarning, LedgerOutput, MalformedFillError, PositionLedger,
    StatisticsSnapshot, Thresholds, Verdict,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Per-address failure. Recoverable: a batch keeps going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(transparent)]
    Malformed(#[from] MalformedFillError),
    #[error("transport error: {0}")]
    Transport(#[from] DataSourceError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillCounts {
    pub derivative: usize,
    pub spot: usize,
}

/// Full result of analysing one address.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub user: Address,
    pub fill_counts: FillCounts,
    pub ledger: LedgerOutput,
    pub stats: StatisticsSnapshot,
    pub verdict: Verdict,
    pub warnings: Vec<InsufficientDataWarning>,
}

impl Analysis {
    pub fn passes(&self) -> bool {
        self.verdict.passes
    }
}

#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Analyzed(Box<Analysis>),
    /// The venue returned no fills; nothing downstream ran.
    NoData { user: Address },
    Failed { user: Address, error: AnalysisError },
}

impl AnalysisOutcome {
    pub fn user(&self) -> &Address {
        match self {
            AnalysisOutcome::Analyzed(a) => &a.user,
            AnalysisOutcome::NoData { user } | AnalysisOutcome::Failed { user, .. } => user,
        }
    }

    pub fn passes(&self) -> bool {
        matches!(self, AnalysisOutcome::Analyzed(a) if a.passes())
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            AnalysisOutcome::Analyzed(a) => Some(a.as_ref()),
            _ => None,
        }
    }
}

/// Runs classify → ledger → statistics → screening for one address at a time.
///
/// Holds no per-address state; every call builds its own ledger.
#[derive(Debug, Clone)]
pub struct Analyzer {
    datasource: Arc<dyn DataSource>,
    thresholds: Thresholds,
}

impl Analyzer {
    pub fn new(datasource: Arc<dyn DataSource>, thresholds: Thresholds) -> Self {
        Self {
            datasource,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub async fn analyze(&self, user: &Address) -> AnalysisOutcome {
        self.analyze_with(user, &self.thresholds, TimeMs::now()).await
    }

    /// Analyse with explicit thresholds and evaluation time.
    pub async fn analyze_with(
        &self,
        user: &Address,
        thresholds: &Thresholds,
        now: TimeMs,
    ) -> AnalysisOutcome {
        info!(user = %user, "Fetching fills");

        let raws = match self.datasource.fetch_user_fills(user.as_str()).await {
            Ok(raws) => raws,
            Err(e) => {
                warn!(user = %user, error = %e, "Fill fetch failed");
                return AnalysisOutcome::Failed {
                    user: user.clone(),
                    error: AnalysisError::Transport(e),
                };
            }
        };

        if raws.is_empty() {
            info!(user = %user, "No fills found");
            return AnalysisOutcome::NoData { user: user.clone() };
        }

        match analyze_fills(user, &raws, thresholds, now) {
            Ok(analysis) => AnalysisOutcome::Analyzed(Box::new(analysis)),
            Err(e) => {
                warn!(user = %user, error = %e, "Rejected fill history");
                AnalysisOutcome::Failed {
                    user: user.clone(),
                    error: AnalysisError::Malformed(e),
                }
            }
        }
    }
}

/// Synchronous core over an already-fetched fill history.
pub fn analyze_fills(
    user: &Address,
    raws: &[RawFill],
    thresholds: &Thresholds,
    now: TimeMs,
) -> Result<Analysis, MalformedFillError> {
    let (derivative, spot) = count_by_class(raws);
    debug!(user = %user, total = raws.len(), derivative, spot, "Classifying fills");

    let fills = classify_all(raws)?;
    let ledger = PositionLedger::ingest(fills)?;
    let stats = StatisticsSnapshot::compute(&ledger, now)?;
    let verdict = evaluate(&stats, thresholds);

    let mut warnings = ledger.warnings.clone();
    if !stats.has_data() {
        warn!(user = %user, "No closed lots; statistics unavailable");
        warnings.push(InsufficientDataWarning::NoClosedLots);
    }

    if let Some(metrics) = verdict.metrics.as_ref() {
        info!(
            user = %user,
            recent_24h = metrics.frequency.recent_24h_close_count,
            avg_daily = %metrics.frequency.avg_daily_close_count,
            avg_holding_hours = %metrics.avg_holding_hours,
            passes = verdict.passes,
            "Screening complete"
        );
    }

    Ok(Analysis {
        user: user.clone(),
        fill_counts: FillCounts { derivative, spot },
        ledger,
        stats,
        verdict,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;
    use crate::domain::MS_PER_HOUR;
    use serde_json::json;

    const USER: &str = "0x0000000000000000000000000000000000000001";

    fn user() -> Address {
        Address::new(USER.to_string())
    }

    #[tokio::test]
    async fn test_transport_failure_is_recoverable() {
        let ds = Arc::new(MockDataSource::new().with_failure(USER, DataSourceError::RateLimited));
        let analyzer = Analyzer::new(ds, Thresholds::default());
        match analyzer.analyze(&user()).await {
            AnalysisOutcome::Failed { error, .. } => {
                assert_eq!(error, AnalysisError::Transport(DataSourceError::RateLimited))
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_history_is_no_data() {
        let analyzer = Analyzer::new(Arc::new(MockDataSource::new()), Thresholds::default());
        let outcome = analyzer.analyze(&user()).await;
        assert!(matches!(outcome, AnalysisOutcome::NoData { .. }));
        assert!(!outcome.passes());
    }

    #[tokio::test]
    async fn test_malformed_fill_aborts_address() {
        let ds = Arc::new(MockDataSource::new().with_fills(
            USER,
            vec![
                json!({"coin": "BTC", "sz": "1", "px": "1", "time": 0, "dir": "Open Long"}),
                json!({"coin": "BTC", "sz": "1", "px": "n/a", "time": 1, "dir": "Close Long"}),
            ],
        ));
        let analyzer = Analyzer::new(ds, Thresholds::default());
        match analyzer.analyze(&user()).await {
            AnalysisOutcome::Failed {
                error: AnalysisError::Malformed(e),
                ..
            } => assert_eq!(e.field, "px"),
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_only_opens_reports_no_closed_lots() {
        let raws = vec![RawFill::new(
            json!({"coin": "BTC", "sz": "1", "px": "1", "time": 0, "dir": "Open Long"}),
        )];
        let analysis =
            analyze_fills(&user(), &raws, &Thresholds::default(), TimeMs::new(MS_PER_HOUR)).unwrap();
        assert!(!analysis.passes());
        assert!(analysis.verdict.metrics.is_none());
        assert_eq!(analysis.warnings, vec![InsufficientDataWarning::NoClosedLots]);
        assert_eq!(analysis.stats.open_positions.len(), 1);
    }

    #[test]
    fn test_fill_counts() {
        let raws = vec![
            RawFill::new(json!({"coin": "BTC", "sz": "1", "px": "1", "time": 0, "dir": "Open Long"})),
            RawFill::new(json!({"coin": "PURR/USDC", "sz": "1", "px": "1", "time": 0, "dir": "Buy"})),
            RawFill::new(json!({"coin": "PURR/USDC", "sz": "1", "px": "1", "time": 1, "dir": "Sell"})),
        ];
        let analysis = analyze_fills(&user(), &raws, &Thresholds::default(), TimeMs::new(2)).unwrap();
        assert_eq!(analysis.fill_counts, FillCounts { derivative: 1, spot: 2 });
    }

    #[test]
    fn test_out_of_range_histories_are_rejected() {
        let oversized = vec![
            RawFill::new(json!({"coin": "BTC", "sz": "50000000000000000000000000000", "px": "1", "time": 0, "dir": "Open Long"})),
            RawFill::new(json!({"coin": "BTC", "sz": "50000000000000000000000000000", "px": "1", "time": 2 * MS_PER_HOUR, "dir": "Close Long"})),
        ];
        let err = analyze_fills(&user(), &oversized, &Thresholds::default(), TimeMs::new(0)).unwrap_err();
        assert_eq!(err.field, "sz");

        let extreme_times = vec![
            RawFill::new(json!({"coin": "BTC", "sz": "1", "px": "1", "time": i64::MIN + 1, "dir": "Open Long"})),
            RawFill::new(json!({"coin": "BTC", "sz": "1", "px": "1", "time": i64::MAX, "dir": "Close Long"})),
        ];
        let err = analyze_fills(&user(), &extreme_times, &Thresholds::default(), TimeMs::new(0)).unwrap_err();
        assert_eq!(err.field, "time");
    }

    #[tokio::test]
    async fn test_out_of_range_history_fails_address() {
        let ds = Arc::new(MockDataSource::new().with_fills(
            USER,
            vec![
                json!({"coin": "ETH", "sz": "50000000000000000000000000000", "px": "1", "time": 0, "dir": "Open Short"}),
                json!({"coin": "ETH", "sz": "50000000000000000000000000000", "px": "1", "time": 2 * MS_PER_HOUR, "dir": "Close Short"}),
            ],
        ));
        let analyzer = Analyzer::new(ds, Thresholds::default());
        match analyzer.analyze(&user()).await {
            AnalysisOutcome::Failed {
                error: AnalysisError::Malformed(e),
                ..
            } => assert_eq!(e.field, "sz"),
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }
}
