//! Canonical in-memory representation of a time-series bar (OHLCV).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::InvalidInput;

/// A single time-series bar (OHLCV) for a given timestamp.
///
/// The sampling interval is a property of the owning series, not of the bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The timestamp for this bar (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Checks the per-bar field rules; `index` is the bar's position in its series.
    pub fn validate(&self, index: usize) -> Result<(), InvalidInput> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(InvalidInput::NonFiniteField {
                    index,
                    field,
                    value,
                });
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(InvalidInput::NegativeVolume {
                index,
                volume: self.volume,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar() -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        Bar::new(ts, 1.1, 1.2, 1.0, 1.15, 42.0)
    }

    #[test]
    fn valid_bar_passes() {
        assert_eq!(bar().validate(0), Ok(()));
    }

    #[test]
    fn nan_price_is_rejected() {
        let mut b = bar();
        b.low = f64::NAN;
        match b.validate(3) {
            Err(InvalidInput::NonFiniteField { index, field, .. }) => {
                assert_eq!(index, 3);
                assert_eq!(field, "low");
            }
            other => panic!("expected NonFiniteField, got {other:?}"),
        }
    }

    #[test]
    fn negative_volume_is_rejected() {
        let mut b = bar();
        b.volume = -1.0;
        assert!(matches!(
            b.validate(0),
            Err(InvalidInput::NegativeVolume { .. })
        ));
    }

    #[test]
    fn zero_volume_is_fine() {
        let mut b = bar();
        b.volume = 0.0;
        assert!(b.validate(0).is_ok());
    }
}
