//! Two-step configuration form: turns decoded form fields into a typed
//! `SimulationConfig`.
//!
//! Step 1 picks populations from the color palette and sets their initial
//! parameters. Step 2 adds pairwise kill chances and the run-wide parameters.
//! Numeric fields that are missing, malformed or out of range fall back to a
//! default rather than failing the request.

use popsim_core::{
    Color, GlobalProbabilities, Interaction, PopulationSpec, Region, SimulationConfig,
    COUNT_RANGE, DEFAULT_COUNT, DEFAULT_GENERATIONS, DEFAULT_GROWTH_RATE, GENERATION_RANGE,
    UNIT_RANGE,
};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

pub type FormFields = HashMap<String, String>;

pub const ACTION_CONFIGURE: &str = "configure";
pub const ACTION_RUN: &str = "run";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Select at least one population to continue.")]
    NoPopulationSelected,

    #[error("Fill in the initial count and reproduction rate for population '{0}' before continuing.")]
    MissingFields(Color),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Configure,
    Run,
    Unknown,
}

impl FormAction {
    pub fn from_fields(fields: &FormFields) -> Self {
        match fields.get("action").map(|a| a.trim()) {
            Some(ACTION_CONFIGURE) => FormAction::Configure,
            Some(ACTION_RUN) => FormAction::Run,
            _ => FormAction::Unknown,
        }
    }
}

pub fn select_field(color: Color) -> String {
    format!("select_{}", color)
}

pub fn count_field(color: Color) -> String {
    format!("{}_count", color)
}

pub fn rate_field(color: Color) -> String {
    format!("{}_rate", color)
}

pub fn region_field(color: Color) -> String {
    format!("{}_region", color)
}

pub fn interaction_field(attacker: Color, victim: Color) -> String {
    format!("int_{}_{}", attacker, victim)
}

/// Palette colors whose checkbox is present, in palette order
pub fn selected_colors(fields: &FormFields) -> Vec<Color> {
    Color::ALL
        .into_iter()
        .filter(|color| fields.contains_key(&select_field(*color)))
        .collect()
}

/// Step 1: at least one population, each with its count and rate filled in
pub fn check_selection(fields: &FormFields) -> Result<Vec<Color>, FormError> {
    let selected = selected_colors(fields);
    if selected.is_empty() {
        return Err(FormError::NoPopulationSelected);
    }

    for color in &selected {
        let filled = |key: String| fields.get(&key).is_some_and(|v| !v.trim().is_empty());
        if !filled(count_field(*color)) || !filled(rate_field(*color)) {
            return Err(FormError::MissingFields(*color));
        }
    }

    Ok(selected)
}

/// Step 2: build the run configuration, substituting defaults for bad values
pub fn build_config(fields: &FormFields) -> Result<SimulationConfig, FormError> {
    let selected = selected_colors(fields);
    if selected.is_empty() {
        return Err(FormError::NoPopulationSelected);
    }

    let field = |key: String| fields.get(&key).map(String::as_str);

    let populations = selected
        .iter()
        .map(|&color| {
            PopulationSpec::new(
                color.label(),
                parse_int(field(count_field(color)), COUNT_RANGE, DEFAULT_COUNT),
                parse_float(field(rate_field(color)), UNIT_RANGE, DEFAULT_GROWTH_RATE),
                field(region_field(color))
                    .and_then(|r| r.parse::<Region>().ok())
                    .unwrap_or_default(),
            )
        })
        .collect();

    let mut interactions = Vec::new();
    for &attacker in &selected {
        for &victim in &selected {
            if attacker == victim {
                continue;
            }
            let chance = parse_float(field(interaction_field(attacker, victim)), UNIT_RANGE, 0.0);
            if chance > 0.0 {
                interactions.push(Interaction::new(attacker.label(), victim.label(), chance));
            }
        }
    }

    let probabilities = GlobalProbabilities {
        combine_same_region: parse_float(field("combine_same_region".into()), UNIT_RANGE, 0.0),
        combine_cross_region: parse_float(field("combine_cross_region".into()), UNIT_RANGE, 0.0),
        mutation_chance: parse_float(field("mutation_chance".into()), UNIT_RANGE, 0.0),
    };

    Ok(SimulationConfig {
        populations,
        interactions,
        probabilities,
        generations: parse_int(field("generations".into()), GENERATION_RANGE, DEFAULT_GENERATIONS),
        seed: field("seed".into()).and_then(|s| s.trim().parse().ok()),
    })
}

/// Integer field value, or `default` when missing, malformed or outside `range`
pub fn parse_int<T>(value: Option<&str>, range: RangeInclusive<T>, default: T) -> T
where
    T: FromStr + PartialOrd,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| range.contains(v))
        .unwrap_or(default)
}

/// Float field value, or `default` when missing, malformed or outside `range`
pub fn parse_float(value: Option<&str>, range: RangeInclusive<f64>, default: f64) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| range.contains(v))
        .unwrap_or(default)
}
