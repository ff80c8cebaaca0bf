//! Replay historical OHLCV series as if they were a live feed.
//!
//! The core is [`replay::ReplaySimulator`]: a series split at an instant into
//! a past partition and a future partition, advanced one bar at a time.
//! Around it sit the collaborators a replay session needs: a CSV
//! [`io::loader`], a [`resample`]r, snapshot persistence in [`io`], a
//! multi-instrument [`replay::coordinator`], and TOML [`config`].

pub mod bucket;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod io;
pub mod models;
pub mod replay;
pub mod resample;
pub mod session;
pub mod tz;

pub use errors::{Error, InvalidInput};
pub use models::{bar::Bar, bar_series::BarSeries, timeframe::Timeframe};
