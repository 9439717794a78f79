//! Fill records: the untyped venue payload and its classified form.

use crate::domain::{Action, Coin, Decimal, TimeMs, TradeClass};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fill exactly as the venue returned it.
///
/// Nothing is coerced here; the classifier is the only place that reads
/// fields out of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFill(pub Value);

impl RawFill {
    pub fn new(value: Value) -> Self {
        RawFill(value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Instrument identifier, if present as a string.
    pub fn coin(&self) -> Option<&str> {
        self.get("coin").and_then(Value::as_str)
    }

    /// Market-class hint carried by the venue payload.
    pub fn market_hint(&self) -> Option<&str> {
        self.get("crossed").and_then(Value::as_str)
    }
}

/// A fill after validation and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub coin: Coin,
    /// Always a positive magnitude.
    pub sz: Decimal,
    pub px: Decimal,
    pub time_ms: TimeMs,
    /// Venue direction tag, e.g. "Open Long" or "Sell".
    pub dir: String,
    pub class: TradeClass,
    pub action: Action,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_fill_accessors() {
        let raw = RawFill::new(json!({"coin": "PURR/USDC", "crossed": "spot"}));
        assert_eq!(raw.coin(), Some("PURR/USDC"));
        assert_eq!(raw.market_hint(), Some("spot"));
    }

    #[test]
    fn test_raw_fill_bool_hint_is_ignored() {
        let raw = RawFill::new(json!({"coin": "BTC", "crossed": true}));
        assert_eq!(raw.market_hint(), None);
    }

    #[test]
    fn test_raw_fill_is_transparent_json() {
        let raw: RawFill = serde_json::from_str(r#"{"coin":"ETH","sz":"1"}"#).unwrap();
        assert_eq!(raw.coin(), Some("ETH"));
        assert_eq!(serde_json::to_string(&raw).unwrap(), r#"{"coin":"ETH","sz":"1"}"#);
    }
}
