//! Domain types for holding-time analysis.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeMs, Address, Coin, TradeClass, Action
//! - Raw (untyped venue) and classified Fill types
//! - Stable time ordering for fills

pub mod decimal;
pub mod fill;
pub mod ordering;
pub mod primitives;

pub use decimal::Decimal;
pub use fill::{Fill, RawFill};
pub use ordering::sort_fills_by_time;
pub use primitives::{
    Action, Address, AddressParseError, Coin, TimeMs, TradeClass, MS_PER_DAY, MS_PER_HOUR,
};
