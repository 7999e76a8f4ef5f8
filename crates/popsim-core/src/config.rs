//! Configuration types for the simulation.

use crate::{Error, Interaction, Region, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Accepted initial population sizes
pub const COUNT_RANGE: RangeInclusive<u64> = 1..=1000;
/// Accepted number of generations per run
pub const GENERATION_RANGE: RangeInclusive<u32> = 1..=50;
/// Accepted rates and probabilities
pub const UNIT_RANGE: RangeInclusive<f64> = 0.0..=1.0;

pub const DEFAULT_COUNT: u64 = 100;
pub const DEFAULT_GROWTH_RATE: f64 = 0.1;
pub const DEFAULT_GENERATIONS: u32 = 10;

/// Initial definition of one population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub name: String,
    pub count: u64,
    pub growth_rate: f64,
    #[serde(default)]
    pub region: Region,
}

impl PopulationSpec {
    pub fn new(name: impl Into<String>, count: u64, growth_rate: f64, region: Region) -> Self {
        Self {
            name: name.into(),
            count,
            growth_rate,
            region,
        }
    }
}

/// Probabilities that apply to the whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalProbabilities {
    /// Reserved for a same-region cross-breeding rule; carried but not acted on
    pub combine_same_region: f64,
    /// Reserved for a cross-region cross-breeding rule; carried but not acted on
    pub combine_cross_region: f64,
    /// Per-generation chance of a mutation event
    pub mutation_chance: f64,
}

/// Fully typed input of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub populations: Vec<PopulationSpec>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub probabilities: GlobalProbabilities,
    #[serde(default = "default_generations")]
    pub generations: u32,
    /// Seed for the run's random source; a fresh one is drawn when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_generations() -> u32 {
    DEFAULT_GENERATIONS
}

impl SimulationConfig {
    pub fn new(populations: Vec<PopulationSpec>, generations: u32) -> Self {
        Self {
            populations,
            interactions: Vec::new(),
            probabilities: GlobalProbabilities::default(),
            generations,
            seed: None,
        }
    }

    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interactions.push(interaction);
        self
    }

    pub fn with_mutation_chance(mut self, chance: f64) -> Self {
        self.probabilities.mutation_chance = chance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the preconditions the engine relies on. Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.populations.is_empty() {
            return Err(Error::validation("at least one population is required"));
        }

        let mut names = HashSet::new();
        for pop in &self.populations {
            if pop.name.trim().is_empty() {
                return Err(Error::validation("population name must not be empty"));
            }
            if !names.insert(pop.name.as_str()) {
                return Err(Error::validation(format!("duplicate population '{}'", pop.name)));
            }
            if !COUNT_RANGE.contains(&pop.count) {
                return Err(Error::validation(format!(
                    "count of '{}' must be within {}..={}, got {}",
                    pop.name,
                    COUNT_RANGE.start(),
                    COUNT_RANGE.end(),
                    pop.count
                )));
            }
            check_unit(&format!("growth rate of '{}'", pop.name), pop.growth_rate)?;
        }

        for interaction in &self.interactions {
            if interaction.attacker == interaction.victim {
                return Err(Error::validation(format!(
                    "'{}' cannot prey on itself",
                    interaction.attacker
                )));
            }
            for name in [&interaction.attacker, &interaction.victim] {
                if !names.contains(name.as_str()) {
                    return Err(Error::validation(format!(
                        "interaction references unknown population '{}'",
                        name
                    )));
                }
            }
            if !(interaction.kill_fraction > 0.0 && interaction.kill_fraction <= 1.0) {
                return Err(Error::validation(format!(
                    "kill fraction of {} on {} must be within (0, 1], got {}",
                    interaction.attacker, interaction.victim, interaction.kill_fraction
                )));
            }
        }

        check_unit("same-region combine chance", self.probabilities.combine_same_region)?;
        check_unit("cross-region combine chance", self.probabilities.combine_cross_region)?;
        check_unit("mutation chance", self.probabilities.mutation_chance)?;

        if !GENERATION_RANGE.contains(&self.generations) {
            return Err(Error::validation(format!(
                "generations must be within {}..={}, got {}",
                GENERATION_RANGE.start(),
                GENERATION_RANGE.end(),
                self.generations
            )));
        }

        Ok(())
    }
}

fn check_unit(what: &str, value: f64) -> Result<()> {
    if UNIT_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "{} must be within [0, 1], got {}",
            what, value
        )))
    }
}

/// Output format of the server's log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `POPSIM_BIND_ADDRESS`, `POPSIM_PORT` and `POPSIM_LOG_FORMAT`.
    /// Malformed values keep the default and are reported back as warnings, since the
    /// log subscriber is not installed yet when this runs.
    pub fn from_env() -> (Self, Vec<String>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        if let Some(addr) = lookup("POPSIM_BIND_ADDRESS") {
            if !addr.trim().is_empty() {
                config.bind_address = addr.trim().to_string();
            }
        }

        if let Some(port) = lookup("POPSIM_PORT") {
            match port.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => warnings.push(format!(
                    "ignoring POPSIM_PORT={:?}, using {}",
                    port, config.port
                )),
            }
        }

        if let Some(format) = lookup("POPSIM_LOG_FORMAT") {
            match format.trim().to_ascii_lowercase().as_str() {
                "pretty" => config.log_format = LogFormat::Pretty,
                "json" => config.log_format = LogFormat::Json,
                _ => warnings.push(format!("ignoring POPSIM_LOG_FORMAT={:?}", format)),
            }
        }

        (config, warnings)
    }
}
