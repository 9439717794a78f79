//! Domain primitives: TimeMs, Address, Coin, TradeClass, Action.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub const MS_PER_HOUR: i64 = 60 * 60 * 1000;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Render as `YYYY-MM-DD HH:MM:SS` (UTC), or the raw value if out of range.
    pub fn to_utc_string(&self) -> String {
        use chrono::TimeZone;
        match chrono::Utc.timestamp_millis_opt(self.0).single() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.0.to_string(),
        }
    }
}

/// Wallet address (hex string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid address: {0}")]
pub struct AddressParseError(pub String);

impl Address {
    /// Create an Address without validation.
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Parse a `0x`-prefixed, 40-hex-digit address; the result is lowercased.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError(trimmed.to_string()))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError(trimmed.to_string()));
        }
        Ok(Address(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instrument identifier as reported by the venue (e.g. "BTC", "PURR/USDC").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin(pub String);

impl Coin {
    pub fn new(coin: String) -> Self {
        Coin(coin)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Market class of a fill. Each class is an independent position universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeClass {
    /// Perpetual contract.
    Derivative,
    /// Direct asset exchange.
    Spot,
}

impl TradeClass {
    pub const ALL: [TradeClass; 2] = [TradeClass::Derivative, TradeClass::Spot];

    pub fn label(&self) -> &'static str {
        match self {
            TradeClass::Derivative => "Perp",
            TradeClass::Spot => "Spot",
        }
    }
}

impl std::fmt::Display for TradeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeClass::Derivative => write!(f, "derivative"),
            TradeClass::Spot => write!(f, "spot"),
        }
    }
}

/// Whether a fill adds to or reduces a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Open,
    Close,
}
