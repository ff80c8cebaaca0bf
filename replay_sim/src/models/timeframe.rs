//! Uniform bar intervals.
//!
//! A [`Timeframe`] pairs a non-zero amount with a [`TimeframeUnit`], covering
//! minute, hour, day, week (Monday-based), and month buckets in UTC. It is a
//! property of a [`BarSeries`](crate::models::bar_series::BarSeries), never of
//! an individual bar.
//!
//! Typical usage:
//! ```
//! use std::num::NonZeroU32;
//! use replay_sim::models::timeframe::{Timeframe, TimeframeUnit};
//!
//! let tf: Timeframe = "5m".parse().unwrap();
//! assert_eq!(tf, Timeframe::new(NonZeroU32::new(5).unwrap(), TimeframeUnit::Minute));
//! assert_eq!(tf.to_string(), "5m");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeframeError {
    #[error("empty timeframe")]
    Empty,

    #[error("invalid amount in timeframe {input:?}")]
    InvalidAmount { input: String },

    #[error("unknown timeframe unit {unit:?}")]
    UnknownUnit { unit: String },
}

/// Timeframe granularity (calendar-aware where needed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    /// UTC minute
    Minute,
    /// UTC hour
    Hour,
    /// UTC day
    Day,
    /// Monday-based, UTC
    Week,
    /// calendar months, UTC
    Month,
}

/// A timeframe = amount × unit (e.g., 5-Minute, 1-Hour, 1-Day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    amount: NonZeroU32,
    unit: TimeframeUnit,
}

impl Timeframe {
    pub const fn new(amount: NonZeroU32, unit: TimeframeUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    pub const fn unit(&self) -> TimeframeUnit {
        self.unit
    }

    /// Width in seconds for fixed-size units; `None` for calendar months.
    pub const fn fixed_secs(&self) -> Option<i64> {
        let unit_secs = match self.unit {
            TimeframeUnit::Minute => 60,
            TimeframeUnit::Hour => 3_600,
            TimeframeUnit::Day => 86_400,
            TimeframeUnit::Week => 604_800,
            TimeframeUnit::Month => return None,
        };
        Some(unit_secs * self.amount.get() as i64)
    }
}

/// Display/parse for config and CLI ergonomics (`"5m"`, `"1h"`, `"1D"`, `"6M"`).
impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.amount.get();
        let u = match self.unit {
            TimeframeUnit::Minute => "m",
            TimeframeUnit::Hour => "h",
            TimeframeUnit::Day => "D",
            TimeframeUnit::Week => "W",
            TimeframeUnit::Month => "M",
        };
        write!(f, "{a}{u}")
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeframeError::Empty);
        }
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        // "H" alone means one hour, the way pandas offsets read
        let amount_num: u32 = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| TimeframeError::InvalidAmount {
                input: s.to_string(),
            })?
        };
        let amount = NonZeroU32::new(amount_num).ok_or_else(|| TimeframeError::InvalidAmount {
            input: s.to_string(),
        })?;
        // case matters: "m" is minutes, "M" is months
        let unit = match unit {
            "m" | "min" | "T" => TimeframeUnit::Minute,
            "h" | "H" => TimeframeUnit::Hour,
            "d" | "D" => TimeframeUnit::Day,
            "w" | "W" => TimeframeUnit::Week,
            "M" | "mo" => TimeframeUnit::Month,
            other => {
                return Err(TimeframeError::UnknownUnit {
                    unit: other.to_string(),
                });
            }
        };
        Ok(Timeframe::new(amount, unit))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}
