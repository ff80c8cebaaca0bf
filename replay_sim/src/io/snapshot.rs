//! Reading replay snapshots back from disk.
//!
//! Snapshots are the explicit persistence layer on top of the in-memory
//! simulator: [`CsvSnapshotSink`](crate::io::sink::CsvSnapshotSink) writes
//! them, [`read_snapshot`] and [`restore`] bring them back. Nothing reads or
//! writes these files during steady-state replay.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Error;
use crate::io::loader::{LoadOptions, read_bars};
use crate::models::timeframe::Timeframe;
use crate::replay::simulator::{EmptyPastPolicy, ReplaySimulator, ReplaySnapshot};

pub fn past_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}_past.csv"))
}

pub fn future_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}_future.csv"))
}

pub fn read_snapshot(
    dir: &Path,
    symbol: &str,
    timeframe: Option<Timeframe>,
) -> Result<ReplaySnapshot, Error> {
    let options = LoadOptions::default();
    let past = read_bars(File::open(past_path(dir, symbol))?, &options)?;
    let future = read_bars(File::open(future_path(dir, symbol))?, &options)?;
    debug!(%symbol, past = past.len(), future = future.len(), "read snapshot");
    Ok(ReplaySnapshot {
        symbol: symbol.to_string(),
        timeframe,
        past,
        future,
    })
}

/// Reads a snapshot and rebuilds its simulator.
pub fn restore(
    dir: &Path,
    symbol: &str,
    timeframe: Option<Timeframe>,
    policy: EmptyPastPolicy,
) -> Result<ReplaySimulator, Error> {
    let snapshot = read_snapshot(dir, symbol, timeframe)?;
    Ok(ReplaySimulator::restore(snapshot, policy)?)
}
