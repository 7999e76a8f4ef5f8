//! Counters over the runs this process has served.

use parking_lot::RwLock;
use popsim_world::SimulationReport;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub total_runs: u64,
    pub extinct_runs: u64,
    pub total_generations: u64,
}

/// Aggregate statistics only; run state itself is never shared between requests
pub struct RunTracker {
    stats: RwLock<RunStats>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(RunStats::default()),
        }
    }

    #[instrument(skip_all, fields(generations_run = report.generations_run, extinct = report.extinct))]
    pub fn record(&self, report: &SimulationReport) {
        let mut stats = self.stats.write();
        stats.total_runs += 1;
        stats.total_generations += u64::from(report.generations_run);
        if report.extinct {
            stats.extinct_runs += 1;
        }
        debug!(total_runs = stats.total_runs, "Run recorded");
    }

    pub fn stats(&self) -> RunStats {
        self.stats.read().clone()
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
