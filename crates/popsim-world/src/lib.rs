//! Population simulation engine.
//!
//! Steps a closed set of named populations through discrete generations of
//! predation, reproduction, mutation and extinction, recording what happened
//! as an ordered log.

pub mod log;
pub mod random;
pub mod simulation;

pub use log::{LogEvent, SimulationLog, SurvivorEntry};
pub use random::{seeded_rng, RandomSource};
pub use simulation::{run, Simulation, SimulationReport};
