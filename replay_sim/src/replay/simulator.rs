//! Incremental replay of a historical series.
//!
//! A [`ReplaySimulator`] holds a validated [`BarSeries`] once, as an immutable
//! `Arc<[Bar]>`, and partitions it with a single cursor: `bars[..cursor]` is
//! the past, `bars[cursor..]` the future. Advancing bumps the cursor by one, so
//! past ++ future always equals the original series and the total length
//! never changes.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use replay_sim::models::{bar::Bar, bar_series::BarSeries};
//! use replay_sim::replay::{ReplaySimulator, Step};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
//! let bars = (0..3)
//!     .map(|i| Bar::new(t0 + Duration::hours(i), 1.0, 1.0, 1.0, 1.0, 0.0))
//!     .collect();
//! let series = BarSeries::new("EURUSD", None, bars).unwrap();
//!
//! let mut sim = ReplaySimulator::new(series, t0).unwrap();
//! assert!(matches!(sim.advance(), Step::Advanced(_)));
//! assert!(matches!(sim.advance(), Step::Advanced(_)));
//! assert!(matches!(sim.advance(), Step::EndOfStream));
//! assert_eq!(sim.recent_past(2).len(), 2);
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::InvalidInput;
use crate::models::{
    bar::Bar,
    bar_series::{BarSeries, validate_bars},
    timeframe::Timeframe,
};

/// What to do when the initial past partition would be empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPastPolicy {
    /// Fail construction with [`InvalidInput`].
    #[default]
    Reject,
    /// Start with an empty past; the first advance moves the first bar.
    Allow,
}

/// Lifecycle of a simulator. `Exhausted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayState {
    /// The future still holds bars.
    Active,
    /// The future is empty; advancing is a no-op.
    Exhausted,
}

/// Result of a single [`ReplaySimulator::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub enum Step<'a> {
    /// The oldest future bar was appended to the past.
    Advanced(&'a Bar),
    /// The future was already empty; nothing moved.
    EndOfStream,
}

impl Step<'_> {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Step::Advanced(_))
    }
}

/// Owned copy of a simulator's partitions, suitable for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySnapshot {
    pub symbol: String,
    pub timeframe: Option<Timeframe>,
    pub past: Vec<Bar>,
    pub future: Vec<Bar>,
}

/// Replays one instrument's series as a past stream and a future stream.
///
/// Mutation goes through `&mut self`, which gives a single writer per
/// instance. For readers on other threads, see
/// [`into_shared`](ReplaySimulator::into_shared).
#[derive(Debug, Clone)]
pub struct ReplaySimulator {
    symbol: String,
    timeframe: Option<Timeframe>,
    bars: Arc<[Bar]>,
    initial_past_len: usize,
    cursor: usize,
}

impl ReplaySimulator {
    /// Splits `series` at `split`: bars with `timestamp <= split` form the past.
    ///
    /// Rejects a split instant before the first bar.
    pub fn new(series: BarSeries, split: DateTime<Utc>) -> Result<Self, InvalidInput> {
        Self::with_policy(series, split, EmptyPastPolicy::Reject)
    }

    pub fn with_policy(
        series: BarSeries,
        split: DateTime<Utc>,
        policy: EmptyPastPolicy,
    ) -> Result<Self, InvalidInput> {
        let cursor = series.count_through(split);
        if cursor == 0 && policy == EmptyPastPolicy::Reject {
            return Err(InvalidInput::SplitBeforeFirstBar {
                split,
                first: series.first_timestamp(),
            });
        }
        let (symbol, timeframe, bars) = series.into_parts();
        Ok(Self {
            symbol,
            timeframe,
            bars: bars.into(),
            initial_past_len: cursor,
            cursor,
        })
    }

    /// Rebuilds a simulator from previously captured partitions.
    ///
    /// `past` followed by `future` must form a valid series.
    pub fn from_partitions(
        symbol: impl Into<String>,
        timeframe: Option<Timeframe>,
        past: Vec<Bar>,
        future: Vec<Bar>,
        policy: EmptyPastPolicy,
    ) -> Result<Self, InvalidInput> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(InvalidInput::EmptySymbol);
        }
        if past.is_empty() && policy == EmptyPastPolicy::Reject {
            return Err(InvalidInput::EmptyPast);
        }
        let cursor = past.len();
        let mut bars = past;
        bars.extend(future);
        validate_bars(&bars)?;
        Ok(Self {
            symbol,
            timeframe,
            bars: bars.into(),
            initial_past_len: cursor,
            cursor,
        })
    }

    pub fn restore(
        snapshot: ReplaySnapshot,
        policy: EmptyPastPolicy,
    ) -> Result<Self, InvalidInput> {
        Self::from_partitions(
            snapshot.symbol,
            snapshot.timeframe,
            snapshot.past,
            snapshot.future,
            policy,
        )
    }

    /// Moves the oldest future bar to the end of the past.
    pub fn advance(&mut self) -> Step<'_> {
        if self.cursor == self.bars.len() {
            return Step::EndOfStream;
        }
        self.cursor += 1;
        Step::Advanced(&self.bars[self.cursor - 1])
    }

    /// The last `min(n, past_len)` past bars, oldest first.
    pub fn recent_past(&self, n: usize) -> &[Bar] {
        let start = self.cursor.saturating_sub(n);
        &self.bars[start..self.cursor]
    }

    pub fn past(&self) -> &[Bar] {
        &self.bars[..self.cursor]
    }

    pub fn future(&self) -> &[Bar] {
        &self.bars[self.cursor..]
    }

    pub fn past_len(&self) -> usize {
        self.cursor
    }

    pub fn future_len(&self) -> usize {
        self.bars.len() - self.cursor
    }

    /// Total bar count; constant for the simulator's lifetime.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always `false`: a simulator is built from a non-empty series.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Past length at construction.
    pub fn initial_past_len(&self) -> usize {
        self.initial_past_len
    }

    /// Number of successful advances so far.
    pub fn advanced(&self) -> usize {
        self.cursor - self.initial_past_len
    }

    pub fn state(&self) -> ReplayState {
        if self.cursor == self.bars.len() {
            ReplayState::Exhausted
        } else {
            ReplayState::Active
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state() == ReplayState::Exhausted
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Option<Timeframe> {
        self.timeframe
    }

    /// Timestamp of the newest past bar.
    pub fn frontier(&self) -> Option<DateTime<Utc>> {
        self.past().last().map(|b| b.timestamp)
    }

    /// Timestamp of the bar the next advance would move.
    pub fn next_timestamp(&self) -> Option<DateTime<Utc>> {
        self.future().first().map(|b| b.timestamp)
    }

    pub fn snapshot(&self) -> ReplaySnapshot {
        ReplaySnapshot {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            past: self.past().to_vec(),
            future: self.future().to_vec(),
        }
    }

    pub(crate) fn shared_parts(self) -> (String, Option<Timeframe>, Arc<[Bar]>, usize) {
        (self.symbol, self.timeframe, self.bars, self.cursor)
    }
}
