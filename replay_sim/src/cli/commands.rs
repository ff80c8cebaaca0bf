use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Replay historical bars as a live feed")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay every configured instrument, printing one JSON frame per tick
    Play {
        /// Path to the replay config (replay.toml)
        #[arg(short, long, env = "REPLAY_CONFIG")]
        config: PathBuf,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Ignore tick_interval_ms and replay as fast as possible
        #[arg(long)]
        no_pace: bool,
    },

    /// Split a data file into past/future snapshot files
    Split {
        /// CSV file with Date,Open,High,Low,Close,Volume columns
        #[arg(long)]
        file: PathBuf,

        /// Split instant, RFC-3339 or naive local time (e.g. "2024-05-01 00:00")
        #[arg(long)]
        split: String,

        /// IANA zone for naive dates
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Symbol to use instead of the one derived from the file name
        #[arg(long)]
        symbol: Option<String>,

        /// Output directory for the snapshot files
        #[arg(long, default_value = "STREAM")]
        out: PathBuf,

        /// Accept a split instant before the first bar
        #[arg(long)]
        allow_empty_past: bool,
    },

    /// Move bars from a snapshot's future file to its past file
    Step {
        #[arg(long, default_value = "STREAM")]
        dir: PathBuf,

        #[arg(long)]
        symbol: String,

        /// Number of bars to move
        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Print the most recent past bars of a snapshot as JSON lines
    Tail {
        #[arg(long, default_value = "STREAM")]
        dir: PathBuf,

        #[arg(long)]
        symbol: String,

        #[arg(short, default_value_t = 10)]
        n: usize,
    },
}
