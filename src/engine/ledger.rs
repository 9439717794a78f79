use crate::domain::{sort_fills_by_time, Action, Coin, Decimal, Fill, TimeMs, TradeClass, MS_PER_HOUR};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::warn;

use super::{InsufficientDataWarning, MalformedFillError};

/// A quantity acquired at one time and price, waiting to be closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLot {
    pub entry_time: TimeMs,
    /// Remaining size; only ever shrinks.
    pub size: Decimal,
    pub entry_px: Decimal,
}

/// One (full or partial) match of a closing fill against an open lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedLot {
    pub coin: Coin,
    pub class: TradeClass,
    pub size: Decimal,
    pub holding_hours: Decimal,
    pub open_time: TimeMs,
    pub close_time: TimeMs,
}

impl ClosedLot {
    fn new(
        coin: &Coin,
        class: TradeClass,
        size: Decimal,
        open_time: TimeMs,
        close_time: TimeMs,
    ) -> Result<Self, MalformedFillError> {
        let held_ms = close_time
            .as_ms()
            .checked_sub(open_time.as_ms())
            .ok_or_else(|| MalformedFillError::out_of_range("time"))?;
        Ok(Self {
            coin: coin.clone(),
            class,
            size,
            holding_hours: Decimal::from_i64(held_ms) / Decimal::from_i64(MS_PER_HOUR),
            open_time,
            close_time,
        })
    }
}

/// Lot queues and closed records for one trade class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassLedger {
    /// Per coin, oldest lot at the front.
    pub open: BTreeMap<Coin, VecDeque<OpenLot>>,
    pub closed: BTreeMap<Coin, Vec<ClosedLot>>,
}

impl ClassLedger {
    /// Total remaining size of the open lots for a coin; `None` on overflow.
    pub fn open_size(&self, coin: &Coin) -> Option<Decimal> {
        match self.open.get(coin) {
            Some(lots) => Decimal::checked_sum(lots.iter().map(|l| l.size)),
            None => Some(Decimal::zero()),
        }
    }

    pub fn closed_lots(&self) -> impl Iterator<Item = &ClosedLot> {
        self.closed.values().flatten()
    }

    fn drop_empty_queues(&mut self) {
        self.open.retain(|_, lots| !lots.is_empty());
    }
}

/// Accumulated ledger output for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerOutput {
    pub derivative: ClassLedger,
    pub spot: ClassLedger,
    pub warnings: Vec<InsufficientDataWarning>,
}

impl LedgerOutput {
    pub fn class(&self, class: TradeClass) -> &ClassLedger {
        match class {
            TradeClass::Derivative => &self.derivative,
            TradeClass::Spot => &self.spot,
        }
    }

    /// Closed lots for one class, or for both when `class` is `None`.
    pub fn closed_lots(&self, class: Option<TradeClass>) -> Vec<&ClosedLot> {
        match class {
            Some(c) => self.class(c).closed_lots().collect(),
            None => self
                .derivative
                .closed_lots()
                .chain(self.spot.closed_lots())
                .collect(),
        }
    }

    pub fn has_closed_lots(&self) -> bool {
        !self.derivative.closed.is_empty() || !self.spot.closed.is_empty()
    }
}

/// FIFO lot matcher over two independent universes (derivative and spot).
///
/// Fills must be fed in non-decreasing time order; [`PositionLedger::ingest`]
/// takes care of that.
#[derive(Debug, Default)]
pub struct PositionLedger {
    derivative: ClassLedger,
    spot: ClassLedger,
    warnings: Vec<InsufficientDataWarning>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh ledger from a full fill history.
    ///
    /// Fails when a holding duration does not fit in milliseconds.
    pub fn ingest(mut fills: Vec<Fill>) -> Result<LedgerOutput, MalformedFillError> {
        sort_fills_by_time(&mut fills);
        let mut ledger = Self::new();
        for fill in &fills {
            ledger.process_fill(fill)?;
        }
        Ok(ledger.into_outputs())
    }

    /// Process a single classified fill.
    pub fn process_fill(&mut self, fill: &Fill) -> Result<(), MalformedFillError> {
        match fill.action {
            Action::Open => {
                self.handle_open(fill);
                Ok(())
            }
            Action::Close => self.handle_close(fill),
        }
    }

    fn book_mut(&mut self, class: TradeClass) -> &mut ClassLedger {
        match class {
            TradeClass::Derivative => &mut self.derivative,
            TradeClass::Spot => &mut self.spot,
        }
    }

    pub fn book(&self, class: TradeClass) -> &ClassLedger {
        match class {
            TradeClass::Derivative => &self.derivative,
            TradeClass::Spot => &self.spot,
        }
    }

    /// Append a new lot at the tail of the coin's queue.
    fn handle_open(&mut self, fill: &Fill) {
        self.book_mut(fill.class)
            .open
            .entry(fill.coin.clone())
            .or_default()
            .push_back(OpenLot {
                entry_time: fill.time_ms,
                size: fill.sz,
                entry_px: fill.px,
            });
    }

    /// Consume open lots from the head until the close size is matched.
    fn handle_close(&mut self, fill: &Fill) -> Result<(), MalformedFillError> {
        let class = fill.class;
        let book = self.book_mut(class);
        let queue = book.open.entry(fill.coin.clone()).or_default();
        let mut remaining = fill.sz;
        let mut records = Vec::new();

        while remaining.is_positive() {
            let Some(head) = queue.front_mut() else {
                break;
            };

            if head.size <= remaining {
                records.push(ClosedLot::new(&fill.coin, class, head.size, head.entry_time, fill.time_ms)?);
                remaining -= head.size;
                queue.pop_front();
            } else {
                records.push(ClosedLot::new(&fill.coin, class, remaining, head.entry_time, fill.time_ms)?);
                head.size -= remaining;
                remaining = Decimal::zero();
            }
        }

        if !records.is_empty() {
            book.closed.entry(fill.coin.clone()).or_default().extend(records);
        }

        if remaining.is_positive() {
            warn!(
                coin = %fill.coin,
                class = %class,
                time_ms = fill.time_ms.as_ms(),
                unmatched = %remaining,
                "close exceeds open lots; dropping excess"
            );
            self.warnings.push(InsufficientDataWarning::OverClose {
                coin: fill.coin.clone(),
                class,
                time_ms: fill.time_ms,
                unmatched_size: remaining,
            });
        }
        Ok(())
    }

    /// Get the accumulated outputs; empty queues are dropped.
    pub fn into_outputs(mut self) -> LedgerOutput {
        self.derivative.drop_empty_queues();
        self.spot.drop_empty_queues();
        LedgerOutput {
            derivative: self.derivative,
            spot: self.spot,
            warnings: self.warnings,
        }
    }
}
