//! A validated collection of time-series bars for one instrument.

use chrono::{DateTime, Utc};

use crate::errors::InvalidInput;
use crate::models::{bar::Bar, timeframe::Timeframe};

/// Represents a complete set of time-series data for a single symbol.
///
/// A `BarSeries` can only be built through [`BarSeries::new`], so every value
/// of this type is non-empty, has finite prices, non-negative volumes and
/// strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    timeframe: Option<Timeframe>,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validates `bars` and wraps them with their symbol and timeframe.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Option<Timeframe>,
        bars: Vec<Bar>,
    ) -> Result<Self, InvalidInput> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(InvalidInput::EmptySymbol);
        }
        validate_bars(&bars)?;
        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    /// The symbol this data represents (e.g., "EURUSD").
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The interval of each bar, when known.
    pub fn timeframe(&self) -> Option<Timeframe> {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_timestamp(&self) -> DateTime<Utc> {
        self.bars[0].timestamp
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.bars[self.bars.len() - 1].timestamp
    }

    /// Number of bars with `timestamp <= at`.
    pub fn count_through(&self, at: DateTime<Utc>) -> usize {
        self.bars.partition_point(|b| b.timestamp <= at)
    }

    pub fn into_parts(self) -> (String, Option<Timeframe>, Vec<Bar>) {
        (self.symbol, self.timeframe, self.bars)
    }
}

/// Checks the series invariants on a raw slice of bars.
pub fn validate_bars(bars: &[Bar]) -> Result<(), InvalidInput> {
    if bars.is_empty() {
        return Err(InvalidInput::EmptySeries);
    }
    for (index, bar) in bars.iter().enumerate() {
        bar.validate(index)?;
        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(InvalidInput::NonIncreasingTimestamp {
                    index,
                    previous,
                    current: bar.timestamp,
                });
            }
        }
    }
    Ok(())
}
