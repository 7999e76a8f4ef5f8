//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of every population spawned by a mutation event
pub const MUTANT_PREFIX: &str = "Mutant ";
/// Inclusive bounds of the numeric suffix appended to a mutant name
pub const MUTANT_SUFFIX_RANGE: (u32, u32) = (1, 100);
/// Starting count of a freshly mutated population
pub const MUTANT_INITIAL_COUNT: u64 = 10;
/// Growth rate of a freshly mutated population
pub const MUTANT_GROWTH_RATE: f64 = 0.05;

/// Region a population lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::North, Region::South, Region::East, Region::West];

    pub fn label(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::ALL[0]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::validation(format!("unknown region '{}'", s)))
    }
}

/// Palette of colors a user can pick as population names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Blue,
    Green,
    Yellow,
    Orange,
    Red,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Orange,
        Color::Red,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
            Color::Orange => "Orange",
            Color::Red => "Red",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named compartment of individuals sharing a region and growth rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub name: String,
    pub count: u64,
    pub growth_rate: f64,
    pub region: Region,
}

impl Population {
    pub fn new(name: impl Into<String>, count: u64, growth_rate: f64, region: Region) -> Self {
        Self {
            name: name.into(),
            count,
            growth_rate,
            region,
        }
    }

    /// Population spawned by a mutation event
    pub fn mutant(suffix: u32, region: Region) -> Self {
        Self::new(
            format!("{}{}", MUTANT_PREFIX, suffix),
            MUTANT_INITIAL_COUNT,
            MUTANT_GROWTH_RATE,
            region,
        )
    }

    /// Newborns for one generation; fractional remainders are dropped
    pub fn offspring(&self) -> u64 {
        floor_product(self.count, self.growth_rate)
    }

    pub fn is_extinct(&self) -> bool {
        self.count == 0
    }
}

/// Directed predation rule: `attacker` removes a fraction of `victim` when they share a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub attacker: String,
    pub victim: String,
    pub kill_fraction: f64,
}

impl Interaction {
    pub fn new(attacker: impl Into<String>, victim: impl Into<String>, kill_fraction: f64) -> Self {
        Self {
            attacker: attacker.into(),
            victim: victim.into(),
            kill_fraction,
        }
    }

    /// Individuals removed from a victim of the given size. Never exceeds `victim_count`
    /// while `kill_fraction <= 1`.
    pub fn casualties(&self, victim_count: u64) -> u64 {
        floor_product(victim_count, self.kill_fraction).min(victim_count)
    }
}

/// `floor(count * rate)` for non-negative rates
fn floor_product(count: u64, rate: f64) -> u64 {
    let product = count as f64 * rate;
    if product <= 0.0 || !product.is_finite() {
        0
    } else {
        product.floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offspring_truncates() {
        let pop = Population::new("Blue", 100, 0.1, Region::North);
        assert_eq!(pop.offspring(), 10);

        let pop = Population::new("Blue", 9, 0.1, Region::North);
        assert_eq!(pop.offspring(), 0);

        let pop = Population::new("Blue", 7, 0.5, Region::North);
        assert_eq!(pop.offspring(), 3);
    }

    #[test]
    fn test_casualties_bounded_by_victim() {
        let interaction = Interaction::new("Blue", "Red", 0.5);
        assert_eq!(interaction.casualties(50), 25);
        assert_eq!(interaction.casualties(1), 0);

        let total = Interaction::new("Blue", "Red", 1.0);
        assert_eq!(total.casualties(1), 1);
        assert_eq!(total.casualties(0), 0);
    }

    #[test]
    fn test_region_parse() {
        assert_eq!("north".parse::<Region>().unwrap(), Region::North);
        assert_eq!(" West ".parse::<Region>().unwrap(), Region::West);
        assert!("Up".parse::<Region>().is_err());
        assert_eq!(Region::default(), Region::North);
    }

    #[test]
    fn test_mutant_defaults() {
        let mutant = Population::mutant(42, Region::South);
        assert_eq!(mutant.name, "Mutant 42");
        assert_eq!(mutant.count, MUTANT_INITIAL_COUNT);
        assert_eq!(mutant.growth_rate, MUTANT_GROWTH_RATE);
        assert!(!mutant.is_extinct());
    }
}
