//! Batch screening across many addresses.

use crate::domain::{Address, Decimal};
use crate::engine::ScreeningMetrics;
use crate::orchestration::analyzer::{AnalysisOutcome, Analyzer};
use crate::watchlist::Blacklist;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenStatus {
    Qualified,
    NotQualified,
    NoData,
    Failed,
}

#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub outcome: AnalysisOutcome,
}

impl BatchEntry {
    pub fn user(&self) -> &Address {
        self.outcome.user()
    }

    pub fn status(&self) -> ScreenStatus {
        match &self.outcome {
            AnalysisOutcome::Analyzed(a) if a.passes() => ScreenStatus::Qualified,
            AnalysisOutcome::Analyzed(_) => ScreenStatus::NotQualified,
            AnalysisOutcome::NoData { .. } => ScreenStatus::NoData,
            AnalysisOutcome::Failed { .. } => ScreenStatus::Failed,
        }
    }

    pub fn metrics(&self) -> Option<&ScreeningMetrics> {
        self.outcome
            .analysis()
            .and_then(|a| a.verdict.metrics.as_ref())
    }
}

/// Results of one batch run, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub skipped_blacklisted: usize,
}

impl BatchReport {
    pub fn analyzed_count(&self) -> usize {
        self.entries.len()
    }

    pub fn qualified(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries
            .iter()
            .filter(|e| e.status() == ScreenStatus::Qualified)
    }

    pub fn qualified_count(&self) -> usize {
        self.qualified().count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status() == ScreenStatus::Failed)
            .count()
    }

    /// Percentage of analysed addresses that qualified; zero for an empty batch.
    pub fn pass_rate_pct(&self) -> Decimal {
        Decimal::from_usize(self.qualified_count() * 100)
            .checked_div_or_zero(Decimal::from_usize(self.analyzed_count()))
    }

    /// Write the qualified addresses and their metrics as CSV.
    pub fn write_qualified_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "address",
            "recent_24h_close_count",
            "avg_daily_close_count",
            "total_close_count",
            "avg_holding_hours",
        ])?;

        for entry in self.qualified() {
            let Some(metrics) = entry.metrics() else {
                continue;
            };
            wtr.write_record([
                entry.user().to_string(),
                metrics.frequency.recent_24h_close_count.to_string(),
                metrics.frequency.avg_daily_close_count.to_fixed(2),
                metrics.frequency.total_close_count.to_string(),
                metrics.avg_holding_hours.to_fixed(4),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Screens addresses with at most `concurrency` fetches in flight.
#[derive(Debug, Clone)]
pub struct BatchScreener {
    analyzer: Arc<Analyzer>,
    concurrency: usize,
}

impl BatchScreener {
    pub fn new(analyzer: Arc<Analyzer>, concurrency: usize) -> Self {
        Self {
            analyzer,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn screen(&self, addresses: Vec<Address>, blacklist: &Blacklist) -> BatchReport {
        let total = addresses.len();
        let (targets, skipped): (Vec<_>, Vec<_>) =
            addresses.into_iter().partition(|a| !blacklist.contains(a));

        for addr in &skipped {
            info!(user = %addr, "Skipping blacklisted address");
        }

        info!(
            total,
            screening = targets.len(),
            skipped = skipped.len(),
            concurrency = self.concurrency,
            "Starting batch screening"
        );

        let entries: Vec<BatchEntry> = stream::iter(targets)
            .map(|user| {
                let analyzer = self.analyzer.clone();
                async move {
                    let outcome = analyzer.analyze(&user).await;
                    match &outcome {
                        AnalysisOutcome::Analyzed(a) if a.passes() => {
                            info!(user = %user, "Address qualified")
                        }
                        AnalysisOutcome::Failed { error, .. } => {
                            warn!(user = %user, error = %error, "Address analysis failed")
                        }
                        _ => {}
                    }
                    BatchEntry { outcome }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = BatchReport {
            entries,
            skipped_blacklisted: skipped.len(),
        };

        info!(
            analyzed = report.analyzed_count(),
            qualified = report.qualified_count(),
            failed = report.failed_count(),
            "Batch screening complete"
        );

        report
    }
}
