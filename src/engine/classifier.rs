//! Fill classification: trade class (spot / derivative) and action (open / close).

use crate::domain::{Action, Coin, Decimal, Fill, RawFill, TimeMs, TradeClass};
use serde_json::Value;
use thiserror::Error;

/// Spot instruments are quoted as pairs, e.g. "PURR/USDC".
pub const SPOT_PAIR_SEPARATOR: char = '/';
/// Market-class hint value that marks a spot fill.
pub const SPOT_MARKET_HINT: &str = "spot";
/// Spot direction tag for buys; every other spot tag closes.
pub const SPOT_BUY_DIR: &str = "Buy";
/// Derivative direction tags containing this marker open ("Open Long", "Open Short").
pub const OPEN_DIR_MARKER: &str = "Open";

/// A fill payload is missing a required field or carries a non-numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed fill: field `{field}` {reason}")]
pub struct MalformedFillError {
    pub field: &'static str,
    pub reason: String,
}

impl MalformedFillError {
    fn missing(field: &'static str) -> Self {
        Self {
            field,
            reason: "is missing".to_string(),
        }
    }

    /// The value parsed, but arithmetic on it leaves the representable range.
    pub(crate) fn out_of_range(field: &'static str) -> Self {
        Self {
            field,
            reason: "is out of range".to_string(),
        }
    }

    fn invalid(field: &'static str, value: &Value) -> Self {
        Self {
            field,
            reason: format!("is not valid: {}", value),
        }
    }
}

/// Trade class from the instrument identifier and market hint alone.
pub fn trade_class_of(coin: &str, market_hint: Option<&str>) -> TradeClass {
    if coin.contains(SPOT_PAIR_SEPARATOR) || market_hint == Some(SPOT_MARKET_HINT) {
        TradeClass::Spot
    } else {
        TradeClass::Derivative
    }
}

/// Whether a direction tag opens a position in the given class.
pub fn action_of(class: TradeClass, dir: &str) -> Action {
    let opening = match class {
        TradeClass::Spot => dir == SPOT_BUY_DIR,
        TradeClass::Derivative => dir.contains(OPEN_DIR_MARKER),
    };
    if opening {
        Action::Open
    } else {
        Action::Close
    }
}

/// Validate a raw payload and label it with its class and action.
pub fn classify(raw: &RawFill) -> Result<Fill, MalformedFillError> {
    let coin = match raw.get("coin") {
        None | Some(Value::Null) => return Err(MalformedFillError::missing("coin")),
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(other) => return Err(MalformedFillError::invalid("coin", other)),
    };

    let sz = parse_decimal_field(raw, "sz")?.abs();
    let px = parse_decimal_field(raw, "px")?;
    let time_ms = parse_time_field(raw, "time")?;

    let dir = match raw.get("dir") {
        None | Some(Value::Null) => return Err(MalformedFillError::missing("dir")),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(MalformedFillError::invalid("dir", other)),
    };

    let class = trade_class_of(&coin, raw.market_hint());
    let action = action_of(class, &dir);

    Ok(Fill {
        coin: Coin::new(coin),
        sz,
        px,
        time_ms,
        dir,
        class,
        action,
    })
}

/// Classify every payload, failing on the first malformed one.
pub fn classify_all(raws: &[RawFill]) -> Result<Vec<Fill>, MalformedFillError> {
    raws.iter().map(classify).collect()
}

/// Count payloads per class as (derivative, spot) without full validation.
pub fn count_by_class(raws: &[RawFill]) -> (usize, usize) {
    raws.iter().fold((0, 0), |(perp, spot), raw| {
        match trade_class_of(raw.coin().unwrap_or(""), raw.market_hint()) {
            TradeClass::Derivative => (perp + 1, spot),
            TradeClass::Spot => (perp, spot + 1),
        }
    })
}

fn parse_decimal_field(raw: &RawFill, field: &'static str) -> Result<Decimal, MalformedFillError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(MalformedFillError::missing(field)),
        Some(Value::String(s)) => Decimal::from_str_canonical(s)
            .map_err(|_| MalformedFillError::invalid(field, &Value::String(s.clone()))),
        Some(Value::Number(n)) => Decimal::from_str_canonical(&n.to_string())
            .map_err(|_| MalformedFillError::invalid(field, &Value::Number(n.clone()))),
        Some(other) => Err(MalformedFillError::invalid(field, other)),
    }
}

fn parse_time_field(raw: &RawFill, field: &'static str) -> Result<TimeMs, MalformedFillError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(MalformedFillError::missing(field)),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(TimeMs::new)
            .ok_or_else(|| MalformedFillError::invalid(field, &Value::Number(n.clone()))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(TimeMs::new)
            .map_err(|_| MalformedFillError::invalid(field, &Value::String(s.clone()))),
        Some(other) => Err(MalformedFillError::invalid(field, other)),
    }
}
