use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cli::commands::{Cli, Commands};
use crate::config::load_config_path;
use crate::io::loader::{CsvLoader, LoadOptions};
use crate::io::sink::{CsvSnapshotSink, SnapshotSink};
use crate::io::snapshot::restore;
use crate::models::bar::Bar;
use crate::replay::{EmptyPastPolicy, ReplayState, ReplaySimulator, Step, TickOutcome};
use crate::session::load_session;
use crate::tz::{DstPolicy, parse_instant, parse_zone};

/// One line of `play` output.
#[derive(Serialize)]
struct Frame<'a> {
    tick: u64,
    clock: Option<DateTime<Utc>>,
    advanced: &'a [(String, DateTime<Utc>)],
    windows: IndexMap<&'a str, &'a [Bar]>,
}

#[derive(Serialize)]
struct StepReport<'a> {
    symbol: &'a str,
    moved: Vec<DateTime<Utc>>,
    past: usize,
    future: usize,
    state: ReplayState,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Play {
            config,
            ticks,
            no_pace,
        } => play(&config, ticks, no_pace).await,
        Commands::Split {
            file,
            split,
            timezone,
            symbol,
            out,
            allow_empty_past,
        } => {
            let policy = if allow_empty_past {
                EmptyPastPolicy::Allow
            } else {
                EmptyPastPolicy::Reject
            };
            split_file(&file, &split, &timezone, symbol.as_deref(), out, policy).await
        }
        Commands::Step { dir, symbol, count } => step(dir, &normalize_symbol(&symbol), count).await,
        Commands::Tail { dir, symbol, n } => tail(&dir, &normalize_symbol(&symbol), n),
    }
}

/// Snapshot files are named after upper-cased symbols.
fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

async fn play(config: &Path, ticks: Option<u64>, no_pace: bool) -> anyhow::Result<()> {
    let mut cfg = load_config_path(config)?;
    let applied = cfg.apply_env_overrides()?;
    if !applied.is_empty() {
        info!(?applied, "applied environment overrides");
    }

    let mut coordinator = load_session(&cfg)?;
    let mut progress = coordinator.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let summary = progress.borrow_and_update().clone();
            if summary.remaining == 0 {
                info!(ticks = summary.tick, "replay finished");
            } else {
                debug!(tick = summary.tick, remaining = summary.remaining, "tick observed");
            }
        }
    });

    let mut pacer = (!no_pace && cfg.tick_interval_ms > 0).then(|| {
        let mut interval = tokio::time::interval(Duration::from_millis(cfg.tick_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    let stdout = std::io::stdout();
    loop {
        if ticks.is_some_and(|limit| coordinator.ticks() >= limit) {
            info!(ticks = coordinator.ticks(), "tick limit reached");
            break;
        }
        if let Some(interval) = pacer.as_mut() {
            interval.tick().await;
        }
        let report = match coordinator.tick() {
            TickOutcome::Tick(report) => report,
            TickOutcome::EndOfStream => break,
        };
        let frame = Frame {
            tick: report.tick,
            clock: report.clock,
            advanced: &report.advanced,
            windows: coordinator.windows(cfg.window),
        };
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &frame)?;
        writeln!(out)?;
    }

    if let Some(dir) = &cfg.snapshot_dir {
        let written = CsvSnapshotSink::new(dir)
            .write(&coordinator.snapshots())
            .await?;
        info!(files = written.len(), dir = %dir.display(), "saved replay snapshot");
    }

    drop(coordinator);
    watcher.await.context("progress watcher failed")?;
    Ok(())
}

async fn split_file(
    file: &Path,
    split: &str,
    timezone: &str,
    symbol: Option<&str>,
    out: PathBuf,
    policy: EmptyPastPolicy,
) -> anyhow::Result<()> {
    let tz = parse_zone(timezone)?;
    let loader = CsvLoader::new(LoadOptions {
        timezone: tz,
        ..LoadOptions::default()
    });
    let series = match symbol {
        Some(symbol) => loader.load_path_as(file, &normalize_symbol(symbol))?,
        None => loader.load_path(file)?,
    };
    let at = parse_instant(split, tz, DstPolicy::Strict)
        .with_context(|| format!("invalid split instant {split:?}"))?;
    let sim = ReplaySimulator::with_policy(series, at, policy)?;
    if sim.is_exhausted() {
        warn!(symbol = %sim.symbol(), "split is at or after the last bar; future is empty");
    }

    let written = CsvSnapshotSink::new(out).write(&[sim.snapshot()]).await?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

async fn step(dir: PathBuf, symbol: &str, count: usize) -> anyhow::Result<()> {
    let mut sim = restore(&dir, symbol, None, EmptyPastPolicy::Allow)
        .with_context(|| format!("restore {symbol} from {}", dir.display()))?;

    let mut moved = Vec::with_capacity(count);
    for _ in 0..count {
        match sim.advance() {
            Step::Advanced(bar) => moved.push(bar.timestamp),
            Step::EndOfStream => {
                info!(%symbol, "no more bars in the future partition");
                break;
            }
        }
    }

    CsvSnapshotSink::new(dir).write(&[sim.snapshot()]).await?;
    let report = StepReport {
        symbol: sim.symbol(),
        moved,
        past: sim.past_len(),
        future: sim.future_len(),
        state: sim.state(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn tail(dir: &Path, symbol: &str, n: usize) -> anyhow::Result<()> {
    let sim = restore(dir, symbol, None, EmptyPastPolicy::Allow)
        .with_context(|| format!("restore {symbol} from {}", dir.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for bar in sim.recent_past(n) {
        serde_json::to_writer(&mut out, bar)?;
        writeln!(out)?;
    }
    Ok(())
}
