//! Lockstep replay across several instruments.
//!
//! Independent simulators advance without any cross-series ordering. The
//! [`ReplayCoordinator`] owns one simulator per symbol and advances them as a
//! single logical tick, then publishes a [`TickSummary`] on a `watch` channel
//! so consumers can redraw once per completed tick.
//!
//! Two modes are supported:
//! - [`LockstepMode::Independent`]: every active simulator advances once per
//!   tick, regardless of timestamps.
//! - [`LockstepMode::Aligned`]: only the simulators whose next bar carries the
//!   earliest pending timestamp advance. Every instrument's frontier then stays
//!   at or behind the tick clock, so a frame never mixes a later bar from one
//!   instrument with an earlier bar from another.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::errors::InvalidInput;
use crate::models::bar::Bar;
use crate::replay::simulator::{ReplaySimulator, ReplaySnapshot, Step};

/// How a tick chooses which simulators to advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockstepMode {
    /// Advance every active simulator once.
    Independent,
    /// Advance only the simulators holding the earliest pending bar.
    #[default]
    Aligned,
}

/// Compact notification published after each completed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub clock: Option<DateTime<Utc>>,
    pub advanced: usize,
    pub remaining: usize,
}

/// Detailed result of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// 1-based tick number.
    pub tick: u64,
    /// Latest timestamp moved during this tick.
    pub clock: Option<DateTime<Utc>>,
    /// `(symbol, timestamp)` of every bar moved, in insertion order.
    pub advanced: Vec<(String, DateTime<Utc>)>,
    /// Symbols with an empty future after this tick.
    pub exhausted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum TickOutcome {
    Tick(TickReport),
    /// Every simulator was already exhausted; nothing moved.
    EndOfStream,
}

#[derive(Debug)]
pub struct ReplayCoordinator {
    sims: IndexMap<String, ReplaySimulator>,
    mode: LockstepMode,
    tick: u64,
    notify: watch::Sender<TickSummary>,
}

impl ReplayCoordinator {
    pub fn new(mode: LockstepMode) -> Self {
        let (notify, _) = watch::channel(TickSummary::default());
        Self {
            sims: IndexMap::new(),
            mode,
            tick: 0,
            notify,
        }
    }

    /// Registers a simulator under its symbol; symbols must be unique.
    pub fn insert(&mut self, sim: ReplaySimulator) -> Result<(), InvalidInput> {
        let symbol = sim.symbol().to_string();
        if self.sims.contains_key(&symbol) {
            return Err(InvalidInput::DuplicateSymbol(symbol));
        }
        debug!(%symbol, past = sim.past_len(), future = sim.future_len(), "registered simulator");
        self.sims.insert(symbol, sim);
        Ok(())
    }

    pub fn from_simulators(
        mode: LockstepMode,
        sims: impl IntoIterator<Item = ReplaySimulator>,
    ) -> Result<Self, InvalidInput> {
        let mut coordinator = Self::new(mode);
        for sim in sims {
            coordinator.insert(sim)?;
        }
        Ok(coordinator)
    }

    /// Receiver that observes a [`TickSummary`] after every completed tick.
    pub fn subscribe(&self) -> watch::Receiver<TickSummary> {
        self.notify.subscribe()
    }

    /// Advances the tracked simulators by one logical step.
    pub fn tick(&mut self) -> TickOutcome {
        let clock = match self.mode {
            LockstepMode::Aligned => self.sims.values().filter_map(|s| s.next_timestamp()).min(),
            LockstepMode::Independent => None,
        };
        if self.is_exhausted() {
            return TickOutcome::EndOfStream;
        }

        let mut advanced = Vec::new();
        for (symbol, sim) in &mut self.sims {
            if let (Some(clock), Some(next)) = (clock, sim.next_timestamp()) {
                if next != clock {
                    continue;
                }
            }
            if let Step::Advanced(bar) = sim.advance() {
                advanced.push((symbol.clone(), bar.timestamp));
            }
        }

        self.tick += 1;
        let exhausted: Vec<String> = self
            .sims
            .iter()
            .filter(|(_, s)| s.is_exhausted())
            .map(|(symbol, _)| symbol.clone())
            .collect();
        let clock = advanced.iter().map(|(_, ts)| *ts).max();
        let summary = TickSummary {
            tick: self.tick,
            clock,
            advanced: advanced.len(),
            remaining: self.sims.len() - exhausted.len(),
        };
        debug!(tick = self.tick, ?clock, advanced = advanced.len(), "tick complete");
        if summary.remaining == 0 {
            info!(ticks = self.tick, "all instruments exhausted");
        }
        self.notify.send_replace(summary);

        TickOutcome::Tick(TickReport {
            tick: self.tick,
            clock,
            advanced,
            exhausted,
        })
    }

    /// Every instrument's `recent_past(n)`, in insertion order.
    pub fn windows(&self, n: usize) -> IndexMap<&str, &[Bar]> {
        self.sims
            .iter()
            .map(|(symbol, sim)| (symbol.as_str(), sim.recent_past(n)))
            .collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&ReplaySimulator> {
        self.sims.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.sims.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sims.is_empty()
    }

    /// `true` when no simulator has future bars left (vacuously for none).
    pub fn is_exhausted(&self) -> bool {
        self.sims.values().all(ReplaySimulator::is_exhausted)
    }

    pub fn mode(&self) -> LockstepMode {
        self.mode
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn snapshots(&self) -> Vec<ReplaySnapshot> {
        self.sims.values().map(ReplaySimulator::snapshot).collect()
    }
}
