//! Single-writer, many-reader replay handles.
//!
//! [`ReplaySimulator::into_shared`] splits a simulator into one
//! [`ReplayWriter`] and a cloneable [`ReplayReader`]. The bars never change
//! after construction; the only shared mutable state is the cursor, which the
//! writer publishes with `Release` and readers load with `Acquire`. A reader
//! therefore always sees a complete, ordered prefix of the series and never
//! blocks the writer.

use std::ops::{Deref, Range};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::{bar::Bar, timeframe::Timeframe};
use crate::replay::simulator::{ReplaySimulator, ReplayState};

#[derive(Debug)]
struct SharedCore {
    symbol: String,
    timeframe: Option<Timeframe>,
    bars: Arc<[Bar]>,
    cursor: AtomicUsize,
}

impl SharedCore {
    fn state_at(&self, cursor: usize) -> ReplayState {
        if cursor == self.bars.len() {
            ReplayState::Exhausted
        } else {
            ReplayState::Active
        }
    }
}

/// Result of [`ReplayWriter::advance`].
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum SharedStep {
    Advanced(Bar),
    EndOfStream,
}

/// The only handle allowed to move bars from future to past.
///
/// Not `Clone`: holding `&mut ReplayWriter` is the single-writer guarantee.
#[derive(Debug)]
pub struct ReplayWriter {
    core: Arc<SharedCore>,
}

/// Read-only view of a shared replay; cheap to clone and send across threads.
#[derive(Debug, Clone)]
pub struct ReplayReader {
    core: Arc<SharedCore>,
}

/// A zero-copy window over the past partition at the moment it was taken.
#[derive(Debug, Clone)]
pub struct PastWindow {
    bars: Arc<[Bar]>,
    range: Range<usize>,
}

impl Deref for PastWindow {
    type Target = [Bar];

    fn deref(&self) -> &[Bar] {
        &self.bars[self.range.clone()]
    }
}

impl ReplaySimulator {
    /// Converts this simulator into a writer plus a reader sharing its state.
    pub fn into_shared(self) -> (ReplayWriter, ReplayReader) {
        let (symbol, timeframe, bars, cursor) = self.shared_parts();
        let core = Arc::new(SharedCore {
            symbol,
            timeframe,
            bars,
            cursor: AtomicUsize::new(cursor),
        });
        (
            ReplayWriter {
                core: Arc::clone(&core),
            },
            ReplayReader { core },
        )
    }
}

impl ReplayWriter {
    pub fn advance(&mut self) -> SharedStep {
        // only this handle stores to the cursor
        let cursor = self.core.cursor.load(Ordering::Relaxed);
        if cursor == self.core.bars.len() {
            return SharedStep::EndOfStream;
        }
        self.core.cursor.store(cursor + 1, Ordering::Release);
        SharedStep::Advanced(self.core.bars[cursor].clone())
    }

    pub fn reader(&self) -> ReplayReader {
        ReplayReader {
            core: Arc::clone(&self.core),
        }
    }

    pub fn state(&self) -> ReplayState {
        self.core.state_at(self.core.cursor.load(Ordering::Relaxed))
    }
}

impl ReplayReader {
    /// The last `min(n, past_len)` past bars, oldest first.
    pub fn recent_past(&self, n: usize) -> PastWindow {
        let end = self.core.cursor.load(Ordering::Acquire);
        PastWindow {
            bars: Arc::clone(&self.core.bars),
            range: end.saturating_sub(n)..end,
        }
    }

    pub fn past_len(&self) -> usize {
        self.core.cursor.load(Ordering::Acquire)
    }

    pub fn future_len(&self) -> usize {
        self.core.bars.len() - self.past_len()
    }

    pub fn len(&self) -> usize {
        self.core.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.bars.is_empty()
    }

    pub fn state(&self) -> ReplayState {
        self.core.state_at(self.past_len())
    }

    pub fn symbol(&self) -> &str {
        &self.core.symbol
    }

    pub fn timeframe(&self) -> Option<Timeframe> {
        self.core.timeframe
    }
}
