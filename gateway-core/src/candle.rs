//! Candle value types and the progressive fetch window

use serde::{Deserialize, Serialize};

/// One OHLCV price bar for a fixed time period.
///
/// Immutable once retrieved from the upstream; `time` is seconds since epoch,
/// aligned to the bar period by the upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
}

impl Candle {
    /// Derive the deduplication key for this candle.
    pub fn key(&self) -> CandleKey {
        CandleKey {
            time: self.time,
            open: self.open.to_bits(),
            close: self.close.to_bits(),
            high: self.high.to_bits(),
            low: self.low.to_bits(),
            volume: self.volume,
        }
    }
}

/// Identity key over *all* candle fields.
///
/// Two candles are duplicates only when every field matches exactly; the
/// float fields compare by bit pattern. Bars that differ by float jitter in
/// any price field therefore survive deduplication as distinct entries.
/// Known weakness of the full-field rule, kept as the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandleKey {
    time: i64,
    open: u64,
    close: u64,
    high: u64,
    low: u64,
    volume: i64,
}

/// Input to a progressive fetch: how much history to assemble and in what
/// stride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchWindow {
    pub asset: String,
    pub period_secs: i64,
    pub days: i64,
    pub offset_secs: i64,
}

impl FetchWindow {
    /// Number of retrieval calls the fetch will issue (one per notional hour
    /// of requested history). Saturates instead of overflowing on absurd
    /// day counts; the fetcher bounds them before use.
    pub fn size(&self) -> usize {
        self.days.saturating_mul(24).max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle() -> Candle {
        Candle {
            time: 1_700_000_000,
            open: 1.0850,
            close: 1.0853,
            high: 1.0855,
            low: 1.0849,
            volume: 420,
        }
    }

    #[test]
    fn test_key_equal_for_identical_candles() {
        assert_eq!(candle().key(), candle().key());
    }

    #[test]
    fn test_key_distinct_when_volume_differs() {
        let a = candle();
        let mut b = candle();
        b.volume += 1;
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_key_distinct_on_float_jitter() {
        let a = candle();
        let mut b = candle();
        b.close += f64::EPSILON;
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_value(candle()).unwrap();
        for field in ["time", "open", "close", "high", "low", "volume"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_window_size() {
        let window = FetchWindow {
            asset: "EURUSD_otc".to_string(),
            period_secs: 60,
            days: 3,
            offset_secs: 3600,
        };
        assert_eq!(window.size(), 72);
    }
}
