//! Turns a [`ReplayConfig`] into a ready-to-tick [`ReplayCoordinator`].

use anyhow::Context;
use tracing::info;

use crate::config::ReplayConfig;
use crate::io::loader::CsvLoader;
use crate::replay::{ReplayCoordinator, ReplaySimulator};
use crate::resample::resample;

/// Loads, optionally resamples, and splits every configured instrument.
pub fn load_session(cfg: &ReplayConfig) -> anyhow::Result<ReplayCoordinator> {
    let split = cfg.split_instant()?;
    let mut coordinator = ReplayCoordinator::new(cfg.lockstep);

    for inst in &cfg.instruments {
        let path = cfg.instrument_path(inst);
        let loader = CsvLoader::new(cfg.load_options(inst)?);
        let mut series = loader
            .load_path_as(&path, &inst.symbol)
            .with_context(|| format!("load {} from {}", inst.symbol, path.display()))?;
        if let Some(tf) = cfg.resample {
            series = resample(&series, tf, cfg.resample_edge)
                .with_context(|| format!("resample {} to {tf}", inst.symbol))?;
        }
        let sim = ReplaySimulator::with_policy(series, split, cfg.empty_past)
            .with_context(|| format!("split {} at {split}", inst.symbol))?;
        info!(
            symbol = %inst.symbol,
            past = sim.past_len(),
            future = sim.future_len(),
            "split series into past and future"
        );
        coordinator.insert(sim)?;
    }
    Ok(coordinator)
}
