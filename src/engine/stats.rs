//! Holding-time statistics, recomputed from scratch over closed lots.
//!
//! Every function here is a pure function of the ledger output; nothing is
//! cached or updated incrementally.

use super::ledger::{ClosedLot, LedgerOutput};
use super::MalformedFillError;
use crate::domain::{Coin, Decimal, TimeMs, TradeClass, MS_PER_DAY};
use serde::Serialize;

/// Statistics for one coin within one trade class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinStatistics {
    pub coin: Coin,
    pub class: TradeClass,
    pub close_count: usize,
    /// Mean of record durations, unweighted by size.
    pub simple_avg: Decimal,
    /// Σ(duration × size) / Σ size.
    pub weighted_avg: Decimal,
    pub min_time: Decimal,
    pub max_time: Decimal,
    pub total_size: Decimal,
}

/// Statistics across every coin of a class, or of both classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStatistics {
    pub total_close_count: usize,
    pub overall_simple_avg: Decimal,
    pub overall_weighted_avg: Decimal,
}

/// How often the address closes positions, by close timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseFrequency {
    #[serde(rename = "recent24hCloseCount")]
    pub recent_24h_close_count: usize,
    pub avg_daily_close_count: Decimal,
    pub total_close_count: usize,
    /// Active span in days, floored at one.
    pub total_days: Decimal,
    pub first_close_time: TimeMs,
    pub last_close_time: TimeMs,
}

/// Residual open size for one coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPositionSummary {
    pub coin: Coin,
    pub class: TradeClass,
    pub total_size: Decimal,
    pub lot_count: usize,
}

/// Running sums over closed lots.
///
/// Every addition and product is checked; an overflow is charged to the
/// field that drove it.
#[derive(Default)]
struct Totals {
    count: usize,
    hours: Decimal,
    weighted: Decimal,
    size: Decimal,
}

impl Totals {
    fn over<'a, I>(records: I) -> Result<Self, MalformedFillError>
    where
        I: IntoIterator<Item = &'a ClosedLot>,
    {
        let mut totals = Totals::default();
        for record in records {
            totals.count += 1;
            totals.hours = totals
                .hours
                .checked_add(record.holding_hours)
                .ok_or_else(|| MalformedFillError::out_of_range("time"))?;
            totals.weighted = record
                .holding_hours
                .checked_mul(record.size)
                .and_then(|w| totals.weighted.checked_add(w))
                .ok_or_else(|| MalformedFillError::out_of_range("sz"))?;
            totals.size = totals
                .size
                .checked_add(record.size)
                .ok_or_else(|| MalformedFillError::out_of_range("sz"))?;
        }
        Ok(totals)
    }

    /// Callers guarantee `count > 0`.
    fn simple_avg(&self) -> Decimal {
        self.hours / Decimal::from_usize(self.count)
    }

    fn weighted_avg(&self) -> Decimal {
        self.weighted.checked_div_or_zero(self.size)
    }
}

/// Per-coin statistics, or `None` when the coin has no closed lots.
pub fn coin_statistics(
    coin: &Coin,
    class: TradeClass,
    records: &[ClosedLot],
) -> Result<Option<CoinStatistics>, MalformedFillError> {
    let (Some(min_time), Some(max_time)) = (
        records.iter().map(|r| r.holding_hours).min(),
        records.iter().map(|r| r.holding_hours).max(),
    ) else {
        return Ok(None);
    };

    let totals = Totals::over(records)?;
    Ok(Some(CoinStatistics {
        coin: coin.clone(),
        class,
        close_count: totals.count,
        simple_avg: totals.simple_avg(),
        weighted_avg: totals.weighted_avg(),
        min_time,
        max_time,
        total_size: totals.size,
    }))
}

/// Overall statistics over any set of closed lots, or `None` when empty.
pub fn overall_statistics<'a, I>(records: I) -> Result<Option<OverallStatistics>, MalformedFillError>
where
    I: IntoIterator<Item = &'a ClosedLot>,
{
    let totals = Totals::over(records)?;
    if totals.count == 0 {
        return Ok(None);
    }

    Ok(Some(OverallStatistics {
        total_close_count: totals.count,
        overall_simple_avg: totals.simple_avg(),
        overall_weighted_avg: totals.weighted_avg(),
    }))
}

/// Close-frequency metrics relative to `now`, or `None` when empty.
///
/// The recent window is `[now - 24h, ∞)`; the active span is floored at one day.
pub fn close_frequency<'a, I>(records: I, now: TimeMs) -> Result<Option<CloseFrequency>, MalformedFillError>
where
    I: IntoIterator<Item = &'a ClosedLot>,
{
    let window_start = now.as_ms().saturating_sub(MS_PER_DAY);
    let mut count = 0usize;
    let mut recent = 0usize;
    let mut first: Option<TimeMs> = None;
    let mut last: Option<TimeMs> = None;

    for record in records {
        count += 1;
        if record.close_time.as_ms() >= window_start {
            recent += 1;
        }
        first = Some(first.map_or(record.close_time, |t| t.min(record.close_time)));
        last = Some(last.map_or(record.close_time, |t| t.max(record.close_time)));
    }

    let (Some(first), Some(last)) = (first, last) else {
        return Ok(None);
    };
    let span_ms = last
        .as_ms()
        .checked_sub(first.as_ms())
        .ok_or_else(|| MalformedFillError::out_of_range("time"))?;
    let span_days = Decimal::from_i64(span_ms) / Decimal::from_i64(MS_PER_DAY);
    let total_days = span_days.max(Decimal::one());

    Ok(Some(CloseFrequency {
        recent_24h_close_count: recent,
        avg_daily_close_count: Decimal::from_usize(count) / total_days,
        total_close_count: count,
        total_days,
        first_close_time: first,
        last_close_time: last,
    }))
}

/// Residual open lots of one class, one summary per coin.
pub fn open_positions(
    ledger: &LedgerOutput,
    class: TradeClass,
) -> Result<Vec<OpenPositionSummary>, MalformedFillError> {
    ledger
        .class(class)
        .open
        .iter()
        .filter(|(_, lots)| !lots.is_empty())
        .map(|(coin, lots)| {
            let total_size = Decimal::checked_sum(lots.iter().map(|l| l.size))
                .ok_or_else(|| MalformedFillError::out_of_range("sz"))?;
            Ok(OpenPositionSummary {
                coin: coin.clone(),
                class,
                total_size,
                lot_count: lots.len(),
            })
        })
        .collect()
}

/// Everything the statistics engine derives from one ledger run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub per_coin: Vec<CoinStatistics>,
    pub derivative: Option<OverallStatistics>,
    pub spot: Option<OverallStatistics>,
    pub combined: Option<OverallStatistics>,
    pub frequency: Option<CloseFrequency>,
    pub open_positions: Vec<OpenPositionSummary>,
}

impl StatisticsSnapshot {
    pub fn compute(ledger: &LedgerOutput, now: TimeMs) -> Result<Self, MalformedFillError> {
        let mut per_coin = Vec::new();
        let mut open = Vec::new();
        for class in TradeClass::ALL {
            for (coin, records) in &ledger.class(class).closed {
                per_coin.extend(coin_statistics(coin, class, records)?);
            }
            open.extend(open_positions(ledger, class)?);
        }

        Ok(Self {
            per_coin,
            derivative: overall_statistics(ledger.closed_lots(Some(TradeClass::Derivative)))?,
            spot: overall_statistics(ledger.closed_lots(Some(TradeClass::Spot)))?,
            combined: overall_statistics(ledger.closed_lots(None))?,
            frequency: close_frequency(ledger.closed_lots(None), now)?,
            open_positions: open,
        })
    }

    pub fn overall(&self, class: Option<TradeClass>) -> Option<&OverallStatistics> {
        match class {
            Some(TradeClass::Derivative) => self.derivative.as_ref(),
            Some(TradeClass::Spot) => self.spot.as_ref(),
            None => self.combined.as_ref(),
        }
    }

    pub fn coins(&self, class: TradeClass) -> impl Iterator<Item = &CoinStatistics> {
        self.per_coin.iter().filter(move |s| s.class == class)
    }

    pub fn open_positions(&self, class: TradeClass) -> impl Iterator<Item = &OpenPositionSummary> {
        self.open_positions.iter().filter(move |p| p.class == class)
    }

    pub fn has_data(&self) -> bool {
        self.combined.is_some()
    }
}
