//! Human-readable console reports.

use crate::domain::{Decimal, TradeClass};
use crate::engine::{CloseFrequency, OverallStatistics, ScreeningMetrics, Thresholds};
use crate::orchestration::{Analysis, BatchReport};
use std::fmt;

const RULE: &str = "============================================================";

/// Minutes below one hour, hours below one day, days otherwise; one decimal.
pub fn format_hours(hours: Decimal) -> String {
    let day = Decimal::from_i64(24);
    if hours < Decimal::one() {
        format!("{} minutes", (hours * Decimal::from_i64(60)).to_fixed(1))
    } else if hours < day {
        format!("{} hours", hours.to_fixed(1))
    } else {
        format!("{} days", (hours / day).to_fixed(1))
    }
}

fn check(ok: bool) -> &'static str {
    if ok {
        "yes"
    } else {
        "no"
    }
}

/// Full per-address report: class sections, comparison and screening block.
pub struct AnalysisReport<'a> {
    pub analysis: &'a Analysis,
    pub thresholds: &'a Thresholds,
    pub show_full_stats: bool,
}

impl AnalysisReport<'_> {
    fn write_class(&self, f: &mut fmt::Formatter<'_>, class: TradeClass) -> fmt::Result {
        let stats = &self.analysis.stats;
        let label = class.label();

        writeln!(f, "--- {} ---", label)?;

        let open: Vec<_> = stats.open_positions(class).collect();
        if !open.is_empty() {
            writeln!(f, "Open {} positions:", label)?;
            for pos in open {
                writeln!(
                    f,
                    "  {}: {} across {} lot(s)",
                    pos.coin,
                    pos.total_size.to_canonical_string(),
                    pos.lot_count
                )?;
            }
        }

        let mut any = false;
        for coin in stats.coins(class) {
            any = true;
            writeln!(f, "{}:", coin.coin)?;
            writeln!(f, "  closes:          {}", coin.close_count)?;
            writeln!(f, "  avg holding:     {}", format_hours(coin.simple_avg))?;
            writeln!(f, "  weighted avg:    {}", format_hours(coin.weighted_avg))?;
            writeln!(f, "  shortest:        {}", format_hours(coin.min_time))?;
            writeln!(f, "  longest:         {}", format_hours(coin.max_time))?;
            writeln!(f, "  total size:      {}", coin.total_size.to_canonical_string())?;
        }
        if !any {
            writeln!(f, "No closed {} positions", label)?;
        }

        if let Some(overall) = stats.overall(Some(class)) {
            write_overall(f, &format!("{} overall", label), overall)?;
        }
        Ok(())
    }
}

fn write_overall(f: &mut fmt::Formatter<'_>, title: &str, s: &OverallStatistics) -> fmt::Result {
    writeln!(
        f,
        "{}: {} closes, avg {}, weighted {}",
        title,
        s.total_close_count,
        format_hours(s.overall_simple_avg),
        format_hours(s.overall_weighted_avg)
    )
}

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.analysis;
        let stats = &analysis.stats;

        writeln!(f, "{}", RULE)?;
        writeln!(f, "Holding time analysis for {}", analysis.user)?;
        writeln!(
            f,
            "Fills: {} perp, {} spot",
            analysis.fill_counts.derivative, analysis.fill_counts.spot
        )?;
        writeln!(f, "{}", RULE)?;

        if self.show_full_stats {
            for class in TradeClass::ALL {
                self.write_class(f, class)?;
            }

            if let (Some(perp), Some(spot)) = (stats.derivative.as_ref(), stats.spot.as_ref()) {
                writeln!(f, "--- Comparison ---")?;
                write_overall(f, "Perp", perp)?;
                write_overall(f, "Spot", spot)?;
                if let Some(all) = stats.combined.as_ref() {
                    write_overall(f, "All", all)?;
                }
            }

            for warning in &analysis.warnings {
                writeln!(f, "warning: {}", warning)?;
            }
        }

        match (stats.frequency.as_ref(), analysis.verdict.metrics.as_ref()) {
            (Some(freq), Some(metrics)) => {
                write!(f, "{}", FrequencyReport { frequency: freq })?;
                write!(
                    f,
                    "{}",
                    CriteriaReport {
                        metrics,
                        thresholds: self.thresholds
                    }
                )?;
            }
            _ => writeln!(f, "No closed positions; cannot screen")?,
        }

        writeln!(
            f,
            "Result: {}",
            if analysis.passes() {
                "QUALIFIED"
            } else {
                "not qualified"
            }
        )
    }
}

struct FrequencyReport<'a> {
    frequency: &'a CloseFrequency,
}

impl fmt::Display for FrequencyReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let freq = self.frequency;
        writeln!(f, "--- Close frequency ---")?;
        writeln!(f, "Closes in last 24h:   {}", freq.recent_24h_close_count)?;
        writeln!(f, "Avg daily closes:     {}", freq.avg_daily_close_count.to_fixed(1))?;
        writeln!(f, "Total closes:         {}", freq.total_close_count)?;
        writeln!(f, "Days spanned:         {}", freq.total_days.to_fixed(1))?;
        writeln!(
            f,
            "Window:               {} .. {}",
            freq.first_close_time.to_utc_string(),
            freq.last_close_time.to_utc_string()
        )
    }
}

struct CriteriaReport<'a> {
    metrics: &'a ScreeningMetrics,
    thresholds: &'a Thresholds,
}

impl fmt::Display for CriteriaReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.metrics;
        let t = self.thresholds;
        writeln!(f, "--- Criteria ---")?;
        writeln!(
            f,
            "24h closes >= {}:       {}",
            t.min_recent_closes,
            check(m.meets_recent_criteria)
        )?;
        writeln!(
            f,
            "avg daily closes >= {}: {}",
            t.min_avg_daily_closes,
            check(m.meets_avg_criteria)
        )?;
        writeln!(
            f,
            "avg holding <= {}h:     {} ({})",
            t.max_avg_holding_hours.to_canonical_string(),
            check(m.meets_holding_time_criteria),
            format_hours(m.avg_holding_hours)
        )
    }
}

/// End-of-run summary for a batch.
pub struct BatchSummaryReport<'a> {
    pub report: &'a BatchReport,
}

impl fmt::Display for BatchSummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Screening summary")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Analysed:   {}", report.analyzed_count())?;
        writeln!(f, "Qualified:  {}", report.qualified_count())?;
        writeln!(f, "Failed:     {}", report.failed_count())?;
        writeln!(f, "Blacklisted: {}", report.skipped_blacklisted)?;
        writeln!(f, "Pass rate:  {}%", report.pass_rate_pct().to_fixed(1))?;

        if report.qualified_count() == 0 {
            return writeln!(f, "No addresses met all criteria");
        }

        writeln!(f, "Qualified addresses:")?;
        for entry in report.qualified() {
            match entry.metrics() {
                Some(m) => writeln!(
                    f,
                    "  {}  24h={} daily={} avg={}",
                    entry.user(),
                    m.frequency.recent_24h_close_count,
                    m.frequency.avg_daily_close_count.to_fixed(1),
                    format_hours(m.avg_holding_hours)
                )?,
                None => writeln!(f, "  {}", entry.user())?,
            }
        }
        Ok(())
    }
}

pub fn render_analysis(analysis: &Analysis, thresholds: &Thresholds, show_full_stats: bool) -> String {
    AnalysisReport {
        analysis,
        thresholds,
        show_full_stats,
    }
    .to_string()
}

pub fn render_batch_summary(report: &BatchReport) -> String {
    BatchSummaryReport { report }.to_string()
}
