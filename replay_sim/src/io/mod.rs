//! Loading series from files and persisting replay snapshots.

pub mod loader;
pub mod sink;
pub mod snapshot;

pub use loader::{CsvLoader, LoadOptions, symbol_from_path};
pub use sink::{CsvSnapshotSink, SinkError, SnapshotSink};
pub use snapshot::{read_snapshot, restore};
