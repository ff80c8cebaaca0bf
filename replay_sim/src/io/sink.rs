use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::{info, warn};

use crate::io::snapshot::{future_path, past_path};
use crate::models::bar::Bar;
use crate::replay::simulator::ReplaySnapshot;
use crate::tz::to_rfc3339;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The snapshot could not be written (e.g. an unusable symbol).
    #[snafu(display("Failed to write snapshot: {message}"))]
    WriteError {
        message: String,
        backtrace: Backtrace,
    },

    /// The CSV writer failed.
    #[snafu(display("CSV error writing {}: {source}", path.display()))]
    Csv {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A filesystem operation failed.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The blocking writer task panicked or was cancelled.
    #[snafu(display("Snapshot task failed: {source}"))]
    Join {
        source: tokio::task::JoinError,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait SnapshotSink {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the paths it created; other sinks may return
    /// counts or identifiers.
    type Output;

    /// Persists a slice of snapshots to the destination.
    async fn write(&self, data: &[ReplaySnapshot]) -> Result<Self::Output, SinkError>;
}

/// Writes `{SYMBOL}_past.csv` and `{SYMBOL}_future.csv` into a directory.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// reader never observes a half-written partition.
#[derive(Debug, Clone)]
pub struct CsvSnapshotSink {
    dir: PathBuf,
}

impl CsvSnapshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SnapshotSink for CsvSnapshotSink {
    type Output = Vec<PathBuf>;

    async fn write(&self, data: &[ReplaySnapshot]) -> Result<Self::Output, SinkError> {
        let dir = self.dir.clone();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || write_snapshots_blocking(&dir, &data))
            .await
            .context(JoinSnafu)?
    }
}

/// Synchronous body of [`CsvSnapshotSink::write`].
///
/// Every partition is first written to a `.csv.tmp` sibling. Renaming starts
/// only once all of them are complete; on failure the temporary files are
/// removed and the previous snapshot is left untouched.
pub fn write_snapshots_blocking(
    dir: &Path,
    data: &[ReplaySnapshot],
) -> Result<Vec<PathBuf>, SinkError> {
    std::fs::create_dir_all(dir).context(IoSnafu { path: dir.to_path_buf() })?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(data.len() * 2);
    if let Err(err) = stage_all(dir, data, &mut staged) {
        discard(&staged);
        return Err(err);
    }

    let mut written = Vec::with_capacity(staged.len());
    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(source) = std::fs::rename(tmp, path) {
            discard(&staged[i..]);
            return Err(source).context(IoSnafu { path: path.clone() });
        }
        written.push(path.clone());
    }
    for snapshot in data {
        info!(
            symbol = %snapshot.symbol.trim(),
            past = snapshot.past.len(),
            future = snapshot.future.len(),
            dir = %dir.display(),
            "wrote snapshot"
        );
    }
    Ok(written)
}

/// Writes every partition to its temporary file, recording `(tmp, final)`
/// pairs as it goes.
fn stage_all(
    dir: &Path,
    data: &[ReplaySnapshot],
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<(), SinkError> {
    for snapshot in data {
        let symbol = snapshot.symbol.trim();
        if symbol.is_empty() || symbol.contains(['/', '\\']) {
            return WriteSnafu {
                message: format!("unusable symbol {:?}", snapshot.symbol),
            }
            .fail();
        }
        for (path, bars) in [
            (past_path(dir, symbol), &snapshot.past),
            (future_path(dir, symbol), &snapshot.future),
        ] {
            let tmp = path.with_extension("csv.tmp");
            let result = write_partition(&tmp, bars);
            staged.push((tmp, path));
            result?;
        }
    }
    Ok(())
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        match std::fs::remove_file(tmp) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %tmp.display(), %err, "could not remove temporary snapshot file");
            }
        }
    }
}

fn write_partition(tmp: &Path, bars: &[Bar]) -> Result<(), SinkError> {
    let mut wtr = csv::Writer::from_path(tmp).context(CsvSnafu { path: tmp })?;
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])
        .context(CsvSnafu { path: tmp })?;
    for bar in bars {
        wtr.write_record([
            to_rfc3339(bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])
        .context(CsvSnafu { path: tmp })?;
    }
    wtr.flush().context(IoSnafu { path: tmp })?;
    Ok(())
}
