//! Executes one simulation run off the async runtime.

use popsim_core::SimulationConfig;
use popsim_world::{seeded_rng, Simulation, SimulationReport};
use tokio::task::JoinError;
use tracing::{info, instrument};

pub struct RunOutcome {
    pub seed: u64,
    pub report: SimulationReport,
}

/// Each call builds its own `Simulation`; nothing is shared between runs.
#[instrument(skip(config), fields(populations = config.populations.len(), generations = config.generations))]
pub async fn execute(config: SimulationConfig) -> Result<RunOutcome, JoinError> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, "Starting simulation run");

    let report =
        tokio::task::spawn_blocking(move || Simulation::new(&config, seeded_rng(seed)).run())
            .await?;

    Ok(RunOutcome { seed, report })
}
