//! Time ordering for fills before they are ledgered.

use crate::domain::Fill;

/// Sort fills by time, oldest first.
///
/// The sort is stable: fills sharing a timestamp keep their input order.
pub fn sort_fills_by_time(fills: &mut [Fill]) {
    fills.sort_by_key(|f| f.time_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, Coin, Decimal, TimeMs, TradeClass};

    fn make_fill(time_ms: i64, dir: &str) -> Fill {
        Fill {
            coin: Coin::new("BTC".to_string()),
            sz: Decimal::one(),
            px: Decimal::from_i64(100),
            time_ms: TimeMs::new(time_ms),
            dir: dir.to_string(),
            class: TradeClass::Derivative,
            action: Action::Open,
        }
    }

    #[test]
    fn test_sort_by_time() {
        let mut fills = vec![make_fill(3000, "a"), make_fill(1000, "b"), make_fill(2000, "c")];
        sort_fills_by_time(&mut fills);
        let times: Vec<i64> = fills.iter().map(|f| f.time_ms.as_ms()).collect();
        assert_eq!(times, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let mut fills = vec![
            make_fill(2000, "first"),
            make_fill(1000, "early"),
            make_fill(2000, "second"),
            make_fill(2000, "third"),
        ];
        sort_fills_by_time(&mut fills);
        let dirs: Vec<&str> = fills.iter().map(|f| f.dir.as_str()).collect();
        assert_eq!(dirs, vec!["early", "first", "second", "third"]);
    }
}
