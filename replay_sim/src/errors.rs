use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::tz::TimeError;

/// Construction-time violations of the series and simulator invariants.
///
/// These are always returned to the caller at the call that triggered them and
/// are never corrected silently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    /// The series holds no bars.
    #[error("series is empty")]
    EmptySeries,

    /// The instrument symbol is blank.
    #[error("symbol cannot be empty")]
    EmptySymbol,

    /// A price field is NaN or infinite.
    #[error("bar {index}: {field} is not finite ({value})")]
    NonFiniteField {
        index: usize,
        field: &'static str,
        value: f64,
    },

    /// Volume is negative or not finite.
    #[error("bar {index}: volume must be a non-negative number, got {volume}")]
    NegativeVolume { index: usize, volume: f64 },

    /// Timestamps are not strictly increasing.
    #[error("bar {index}: timestamp {current} does not follow {previous}")]
    NonIncreasingTimestamp {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// The split instant precedes every bar, leaving the past empty.
    #[error("split instant {split} precedes the first bar at {first}")]
    SplitBeforeFirstBar {
        split: DateTime<Utc>,
        first: DateTime<Utc>,
    },

    /// Restored partitions have no past bars while the policy rejects it.
    #[error("past partition is empty")]
    EmptyPast,

    /// Two simulators were registered under the same symbol.
    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

impl InvalidInput {
    /// Position of the offending bar for per-bar violations.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::NonFiniteField { index, .. }
            | Self::NegativeVolume { index, .. }
            | Self::NonIncreasingTimestamp { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The message without the `bar {index}:` prefix, for callers that
    /// locate the bar themselves (e.g. by file row).
    pub fn describe(&self) -> String {
        match self {
            Self::NonFiniteField { field, value, .. } => format!("{field} is not finite ({value})"),
            Self::NegativeVolume { volume, .. } => {
                format!("volume must be a non-negative number, got {volume}")
            }
            Self::NonIncreasingTimestamp {
                previous, current, ..
            } => format!("timestamp {current} does not follow {previous}"),
            other => other.to_string(),
        }
    }
}

/// The unified error type for the `replay_sim` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Arguments that break a series or simulator invariant.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// A data row could not be parsed.
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// A timestamp could not be resolved to UTC.
    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    /// An error from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
