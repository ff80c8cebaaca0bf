//! Replay configuration: parsing, normalization, and environment overrides.
//!
//! A TOML file describes which instruments to replay, where their files live,
//! the split instant, and how the consumer loop is paced:
//!
//! ```toml
//! data_dir = "DATA"
//! split = "2024-05-01 00:00"
//! timezone = "UTC"
//! window = 100
//! tick_interval_ms = 200
//! lockstep = "aligned"
//!
//! [[instruments]]
//! symbol = "EURUSD"
//! file = "EURUSD_C.csv"
//! ```
//!
//! Key behaviors:
//! - Symbols are trimmed and uppercased; blank or duplicate symbols are errors.
//! - `timezone` and `split` are validated up front so a bad config fails
//!   before any file is read.
//! - `REPLAY_DATA_DIR`, `REPLAY_WINDOW` and `REPLAY_TICK_INTERVAL_MS` override
//!   the file via [`ReplayConfig::apply_env_overrides`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared_utils::parse_env_var;

use crate::io::loader::LoadOptions;
use crate::models::timeframe::Timeframe;
use crate::replay::{EmptyPastPolicy, LockstepMode};
use crate::resample::BucketEdge;
use crate::tz::{DstPolicy, parse_instant, parse_zone};

pub const ENV_CONFIG: &str = "REPLAY_CONFIG";
pub const ENV_DATA_DIR: &str = "REPLAY_DATA_DIR";
pub const ENV_WINDOW: &str = "REPLAY_WINDOW";
pub const ENV_TICK_INTERVAL_MS: &str = "REPLAY_TICK_INTERVAL_MS";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayConfig {
    /// Base directory for relative instrument paths.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Split instant: RFC-3339, or naive local time in `timezone`.
    pub split: String,
    /// IANA zone for naive dates in files and in `split`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub dst_policy: DstPolicy,
    /// Number of past bars each consumer frame shows.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Delay between ticks; 0 replays as fast as possible.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub lockstep: LockstepMode,
    #[serde(default)]
    pub empty_past: EmptyPastPolicy,
    /// Sort rows by date while loading.
    #[serde(default)]
    pub sort: bool,
    /// Aggregate every series onto this timeframe before replay.
    pub resample: Option<Timeframe>,
    #[serde(default)]
    pub resample_edge: BucketEdge,
    /// Where `play` writes a final snapshot, if anywhere.
    pub snapshot_dir: Option<PathBuf>,
    pub instruments: Vec<InstrumentCfg>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentCfg {
    pub symbol: String,
    pub file: PathBuf,
    /// Interval of the raw file, recorded on the loaded series.
    pub timeframe: Option<Timeframe>,
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Symbols changed by trimming or uppercasing.
    pub symbols_renamed: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("DATA")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_window() -> usize {
    100
}

fn default_tick_interval_ms() -> u64 {
    200
}

impl ReplayConfig {
    /// Normalize in place and validate cross-field rules.
    pub fn normalize(&mut self) -> anyhow::Result<NormalizationReport> {
        let mut report = NormalizationReport::default();

        if self.instruments.is_empty() {
            bail!("at least one instrument is required");
        }
        if self.window == 0 {
            bail!("window must be > 0");
        }
        let tz = parse_zone(&self.timezone).context("invalid timezone")?;
        parse_instant(&self.split, tz, self.dst_policy)
            .with_context(|| format!("invalid split instant {:?}", self.split))?;

        let mut seen = HashSet::new();
        for inst in &mut self.instruments {
            let symbol = inst.symbol.trim().to_uppercase();
            if symbol.is_empty() {
                bail!("instrument symbol cannot be empty after trimming");
            }
            if symbol != inst.symbol {
                report.symbols_renamed += 1;
            }
            if !seen.insert(symbol.clone()) {
                bail!("duplicate instrument symbol after normalization: {symbol}");
            }
            inst.symbol = symbol;
        }
        Ok(report)
    }

    /// Applies `REPLAY_*` environment overrides; returns the variables used.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<Vec<&'static str>> {
        let mut applied = Vec::new();
        if let Some(dir) = parse_env_var::<PathBuf>(ENV_DATA_DIR)? {
            self.data_dir = dir;
            applied.push(ENV_DATA_DIR);
        }
        if let Some(window) = parse_env_var::<usize>(ENV_WINDOW)? {
            if window == 0 {
                bail!("{ENV_WINDOW} must be > 0");
            }
            self.window = window;
            applied.push(ENV_WINDOW);
        }
        if let Some(ms) = parse_env_var::<u64>(ENV_TICK_INTERVAL_MS)? {
            self.tick_interval_ms = ms;
            applied.push(ENV_TICK_INTERVAL_MS);
        }
        Ok(applied)
    }

    pub fn tz(&self) -> anyhow::Result<Tz> {
        Ok(parse_zone(&self.timezone)?)
    }

    pub fn split_instant(&self) -> anyhow::Result<DateTime<Utc>> {
        Ok(parse_instant(&self.split, self.tz()?, self.dst_policy)?)
    }

    /// Absolute paths are kept; relative ones are joined onto `data_dir`.
    pub fn instrument_path(&self, inst: &InstrumentCfg) -> PathBuf {
        if inst.file.is_absolute() {
            inst.file.clone()
        } else {
            self.data_dir.join(&inst.file)
        }
    }

    pub fn load_options(&self, inst: &InstrumentCfg) -> anyhow::Result<LoadOptions> {
        Ok(LoadOptions {
            timezone: self.tz()?,
            dst_policy: self.dst_policy,
            sort: self.sort,
            timeframe: inst.timeframe,
            ..LoadOptions::default()
        })
    }
}

/// Parse and normalize a config from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<ReplayConfig> {
    let mut cfg: ReplayConfig =
        toml::from_str(toml_str).context("failed to parse replay config TOML")?;
    cfg.normalize().context("invalid replay config")?;
    Ok(cfg)
}

/// Read a config file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<ReplayConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
