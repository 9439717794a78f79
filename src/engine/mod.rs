//! Pure computation engine: classification, FIFO lot matching, statistics, screening.

use crate::domain::{Coin, Decimal, TimeMs, TradeClass};
use serde::Serialize;

pub mod classifier;
pub mod ledger;
pub mod screening;
pub mod stats;

pub use classifier::{classify, classify_all, MalformedFillError};
pub use ledger::{ClassLedger, ClosedLot, LedgerOutput, OpenLot, PositionLedger};
pub use screening::{evaluate, ScreeningMetrics, Thresholds, Verdict};
pub use stats::{CloseFrequency, CoinStatistics, OpenPositionSummary, OverallStatistics, StatisticsSnapshot};

/// Non-fatal signal that the fill history does not fully explain the result.
///
/// Never an error: callers must be able to tell "no signal" apart from
/// broken input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InsufficientDataWarning {
    /// A close was larger than the open lots visible for its coin and class.
    #[serde(rename_all = "camelCase")]
    OverClose {
        coin: Coin,
        class: TradeClass,
        time_ms: TimeMs,
        unmatched_size: Decimal,
    },
    /// Statistics were requested but no lot was ever closed.
    NoClosedLots,
}

impl std::fmt::Display for InsufficientDataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsufficientDataWarning::OverClose {
                coin,
                class,
                time_ms,
                unmatched_size,
            } => write!(
                f,
                "{} {} close at {} exceeded open lots by {}",
                class,
                coin,
                time_ms.as_ms(),
                unmatched_size
            ),
            InsufficientDataWarning::NoClosedLots => write!(f, "no closed lots"),
        }
    }
}
