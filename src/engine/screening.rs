//! Threshold screening for high-frequency, short-holding-time behaviour.

use super::stats::{CloseFrequency, StatisticsSnapshot};
use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// Screening thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub min_recent_closes: u32,
    pub min_avg_daily_closes: u32,
    pub max_avg_holding_hours: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_recent_closes: 24,
            min_avg_daily_closes: 24,
            max_avg_holding_hours: Decimal::one(),
        }
    }
}

/// Frequency metrics plus each sub-condition of the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningMetrics {
    #[serde(flatten)]
    pub frequency: CloseFrequency,
    /// Overall simple average across both classes.
    pub avg_holding_hours: Decimal,
    pub meets_recent_criteria: bool,
    pub meets_avg_criteria: bool,
    pub meets_holding_time_criteria: bool,
    pub meets_all_criteria: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub passes: bool,
    /// `None` when there were no closed lots to measure.
    pub metrics: Option<ScreeningMetrics>,
}

impl Verdict {
    pub fn no_data() -> Self {
        Self {
            passes: false,
            metrics: None,
        }
    }
}

/// Apply thresholds to a statistics snapshot.
///
/// Passes iff recent closes ≥ `min_recent_closes`, average daily closes ≥
/// `min_avg_daily_closes` and the overall simple average holding time ≤
/// `max_avg_holding_hours`.
pub fn evaluate(stats: &StatisticsSnapshot, thresholds: &Thresholds) -> Verdict {
    let Some(frequency) = stats.frequency.as_ref() else {
        return Verdict::no_data();
    };

    let avg_holding_hours = stats
        .overall(None)
        .map(|o| o.overall_simple_avg)
        .unwrap_or_else(Decimal::zero);

    let meets_recent = frequency.recent_24h_close_count as u64 >= u64::from(thresholds.min_recent_closes);
    let meets_avg = frequency.avg_daily_close_count
        >= Decimal::from_i64(i64::from(thresholds.min_avg_daily_closes));
    let meets_holding_time = avg_holding_hours <= thresholds.max_avg_holding_hours;
    let meets_all = meets_recent && meets_avg && meets_holding_time;

    Verdict {
        passes: meets_all,
        metrics: Some(ScreeningMetrics {
            frequency: frequency.clone(),
            avg_holding_hours,
            meets_recent_criteria: meets_recent,
            meets_avg_criteria: meets_avg,
            meets_holding_time_criteria: meets_holding_time,
            meets_all_criteria: meets_all,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeMs;
    use crate::engine::stats::OverallStatistics;

    fn snapshot(recent: usize, avg_daily: i64, avg_hours: &str) -> StatisticsSnapshot {
        let avg = Decimal::from_str_canonical(avg_hours).unwrap();
        StatisticsSnapshot {
            per_coin: Vec::new(),
            derivative: None,
            spot: None,
            combined: Some(OverallStatistics {
                total_close_count: recent,
                overall_simple_avg: avg,
                overall_weighted_avg: avg,
            }),
            frequency: Some(CloseFrequency {
                recent_24h_close_count: recent,
                avg_daily_close_count: Decimal::from_i64(avg_daily),
                total_close_count: recent,
                total_days: Decimal::one(),
                first_close_time: TimeMs::new(0),
                last_close_time: TimeMs::new(0),
            }),
            open_positions: Vec::new(),
        }
    }

    #[test]
    fn test_each_condition_reported_independently() {
        let verdict = evaluate(&snapshot(30, 10, "2"), &Thresholds::default());
        assert!(!verdict.passes);
        let metrics = verdict.metrics.unwrap();
        assert!(metrics.meets_recent_criteria);
        assert!(!metrics.meets_avg_criteria);
        assert!(!metrics.meets_holding_time_criteria);
        assert!(!metrics.meets_all_criteria);
    }

    #[test]
    fn test_no_frequency_is_no_data() {
        let mut stats = snapshot(0, 0, "0");
        stats.frequency = None;
        let verdict = evaluate(&stats, &Thresholds::default());
        assert_eq!(verdict, Verdict::no_data());
    }

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.min_recent_closes, 24);
        assert_eq!(t.min_avg_daily_closes, 24);
        assert_eq!(t.max_avg_holding_hours, Decimal::one());
    }

    #[test]
    fn test_metrics_serialize_flat() {
        let verdict = evaluate(&snapshot(24, 24, "1"), &Thresholds::default());
        let json = serde_json::to_value(verdict.metrics.unwrap()).unwrap();
        assert_eq!(json["recent24hCloseCount"], 24);
        assert_eq!(json["meetsAllCriteria"], true);
        assert!(json.get("frequency").is_none());
    }
}
