//! Simulation engine: steps the population set one generation at a time.

use crate::log::{LogEvent, SimulationLog, SurvivorEntry};
use crate::random::RandomSource;
use indexmap::IndexMap;
use popsim_core::{
    GlobalProbabilities, Interaction, Population, Region, SimulationConfig, MUTANT_SUFFIX_RANGE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub struct Simulation<R> {
    /// Live populations keyed by name, in insertion order
    populations: IndexMap<String, Population>,
    interactions: Vec<Interaction>,
    probabilities: GlobalProbabilities,
    generations: u32,
    rng: R,
    log: SimulationLog,
    generation: u32,
}

/// Outcome of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub log: SimulationLog,
    /// Generations actually stepped; less than requested when everything died out
    pub generations_run: u32,
    pub survivors: Vec<SurvivorEntry>,
    pub extinct: bool,
}

impl<R: RandomSource> Simulation<R> {
    /// Build the initial state. The configuration is assumed to be validated.
    pub fn new(config: &SimulationConfig, rng: R) -> Self {
        let populations = config
            .populations
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    Population::new(spec.name.clone(), spec.count, spec.growth_rate, spec.region),
                )
            })
            .collect();

        Self {
            populations,
            interactions: config.interactions.clone(),
            probabilities: config.probabilities.clone(),
            generations: config.generations,
            rng,
            log: SimulationLog::new(),
            generation: 0,
        }
    }

    pub fn populations(&self) -> impl Iterator<Item = &Population> {
        self.populations.values()
    }

    /// Run every generation, stopping early once nothing is left alive
    #[instrument(skip_all, fields(generations = self.generations, populations = self.populations.len()))]
    pub fn run(mut self) -> SimulationReport {
        self.log.push(LogEvent::Started {
            populations: self.populations.keys().cloned().collect(),
        });

        for generation in 1..=self.generations {
            self.generation = generation;
            self.step();

            if self.populations.is_empty() {
                self.log.push(LogEvent::AllExtinct);
                break;
            }
        }

        self.log.push(LogEvent::Finished);

        let survivors = self.survivors();
        let extinct = survivors.is_empty();

        info!(
            event = "run_summary",
            requested_generations = self.generations,
            generations_run = self.generation,
            survivors = survivors.len(),
            extinct = extinct,
            "Simulation finished"
        );

        SimulationReport {
            log: self.log,
            generations_run: self.generation,
            survivors,
            extinct,
        }
    }

    /// One generation. Phase order is fixed; later phases see earlier results.
    fn step(&mut self) {
        self.log.push(LogEvent::GenerationHeader {
            generation: self.generation,
        });

        self.predation_phase();
        self.reproduction_phase();
        self.mutation_phase();
        self.extinction_phase();
        self.snapshot_phase();
    }

    /// Interactions apply in order against the victim's current count, so several
    /// attackers on one victim compound.
    fn predation_phase(&mut self) {
        for interaction in &self.interactions {
            let Some(attacker_region) = self
                .populations
                .get(&interaction.attacker)
                .map(|p| p.region)
            else {
                continue;
            };
            let Some(victim) = self.populations.get_mut(&interaction.victim) else {
                continue;
            };
            if victim.region != attacker_region {
                continue;
            }

            let killed = interaction.casualties(victim.count);
            if killed == 0 {
                continue;
            }
            victim.count -= killed;

            debug!(
                generation = self.generation,
                attacker = %interaction.attacker,
                victim = %interaction.victim,
                killed,
                remaining = victim.count,
                "Predation"
            );
            self.log.push(LogEvent::Predation {
                attacker: interaction.attacker.clone(),
                victim: interaction.victim.clone(),
                killed,
                region: attacker_region,
            });
        }
    }

    fn reproduction_phase(&mut self) {
        for population in self.populations.values_mut() {
            population.count = population.count.saturating_add(population.offspring());
        }
    }

    /// At most one mutant per generation. A mutant whose name is already taken
    /// replaces that population in place.
    fn mutation_phase(&mut self) {
        if self.rng.unit() >= self.probabilities.mutation_chance {
            return;
        }

        let (lo, hi) = MUTANT_SUFFIX_RANGE;
        let suffix = self.rng.int_inclusive(lo, hi);
        let region = self.rng.pick(&Region::ALL);
        let mutant = Population::mutant(suffix, region);

        debug!(generation = self.generation, name = %mutant.name, %region, "Mutation");
        self.log.push(LogEvent::Mutation {
            name: mutant.name.clone(),
            region,
        });
        self.populations.insert(mutant.name.clone(), mutant);
    }

    fn extinction_phase(&mut self) {
        let extinct: Vec<String> = self
            .populations
            .values()
            .filter(|p| p.is_extinct())
            .map(|p| p.name.clone())
            .collect();

        for name in extinct {
            self.populations.shift_remove(&name);
            debug!(generation = self.generation, name = %name, "Extinction");
            self.log.push(LogEvent::Extinction { name });
        }
    }

    fn snapshot_phase(&mut self) {
        let survivors = self.survivors();
        self.log.push(LogEvent::Snapshot { survivors });
    }

    fn survivors(&self) -> Vec<SurvivorEntry> {
        let mut survivors: Vec<SurvivorEntry> = self
            .populations
            .values()
            .map(|p| SurvivorEntry {
                name: p.name.clone(),
                count: p.count,
                region: p.region,
            })
            .collect();
        survivors.sort_by(|a, b| a.name.cmp(&b.name));
        survivors
    }
}

/// Run a validated configuration to completion and return its log
pub fn run<R: RandomSource>(config: &SimulationConfig, rng: R) -> SimulationLog {
    Simulation::new(config, rng).run().log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;
    use popsim_core::{PopulationSpec, MUTANT_INITIAL_COUNT};
    use proptest::prelude::*;
    use std::collections::{HashSet, VecDeque};

    /// Replays a fixed script of draws
    #[derive(Default)]
    struct ScriptedSource {
        units: VecDeque<f64>,
        ints: VecDeque<u32>,
        indices: VecDeque<usize>,
    }

    impl ScriptedSource {
        fn never_mutates() -> Self {
            Self {
                units: std::iter::repeat(0.99).take(64).collect(),
                ..Default::default()
            }
        }
    }

    impl RandomSource for ScriptedSource {
        fn unit(&mut self) -> f64 {
            self.units.pop_front().unwrap_or(0.99)
        }

        fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
            self.ints.pop_front().unwrap_or(lo).clamp(lo, hi)
        }

        fn index(&mut self, len: usize) -> usize {
            self.indices.pop_front().unwrap_or(0) % len
        }
    }

    fn spec(name: &str, count: u64, rate: f64, region: Region) -> PopulationSpec {
        PopulationSpec::new(name, count, rate, region)
    }

    fn final_survivors(log: &SimulationLog) -> Vec<SurvivorEntry> {
        log.snapshots().last().map(|s| s.to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_single_population_grows() {
        let config = SimulationConfig::new(vec![spec("A", 100, 0.1, Region::North)], 1);
        let log = run(&config, ScriptedSource::never_mutates());

        assert!(!log
            .events()
            .iter()
            .any(|e| matches!(e, LogEvent::Predation { .. })));
        assert_eq!(
            final_survivors(&log),
            vec![SurvivorEntry {
                name: "A".into(),
                count: 110,
                region: Region::North
            }]
        );
        assert!(log.lines().contains(&"A: 110 individuals | Region: North".to_string()));
        assert_eq!(log.lines().last().map(String::as_str), Some("END"));
    }

    #[test]
    fn test_predation_runs_before_reproduction() {
        let config = SimulationConfig::new(
            vec![
                spec("A", 100, 0.1, Region::North),
                spec("B", 50, 0.1, Region::North),
            ],
            1,
        )
        .with_interaction(Interaction::new("A", "B", 0.5));
        let log = run(&config, ScriptedSource::never_mutates());

        // 50 -> 25 after predation, then +2 offspring; growing first would give 55 -> 28
        let counts: Vec<(String, u64)> = final_survivors(&log)
            .into_iter()
            .map(|s| (s.name, s.count))
            .collect();
        assert_eq!(counts, vec![("A".into(), 110), ("B".into(), 27)]);
        assert!(log.lines().contains(&"B: 27 individuals | Region: North".to_string()));
    }

    #[test]
    fn test_predation_in_shared_region() {
        let config = SimulationConfig::new(
            vec![
                spec("A", 100, 0.0, Region::North),
                spec("B", 50, 0.0, Region::North),
            ],
            1,
        )
        .with_interaction(Interaction::new("A", "B", 0.5));
        let log = run(&config, ScriptedSource::never_mutates());

        assert!(log.events().contains(&LogEvent::Predation {
            attacker: "A".into(),
            victim: "B".into(),
            killed: 25,
            region: Region::North,
        }));
        let counts: Vec<(String, u64)> = final_survivors(&log)
            .into_iter()
            .map(|s| (s.name, s.count))
            .collect();
        assert_eq!(counts, vec![("A".into(), 100), ("B".into(), 25)]);
    }

    #[test]
    fn test_no_predation_across_regions() {
        let config = SimulationConfig::new(
            vec![
                spec("A", 100, 0.0, Region::North),
                spec("B", 50, 0.0, Region::South),
            ],
            3,
        )
        .with_interaction(Interaction::new("A", "B", 1.0));
        let log = run(&config, ScriptedSource::never_mutates());

        assert_eq!(final_survivors(&log)[1].count, 50);
    }

    #[test]
    fn test_attackers_compound_on_same_victim() {
        let config = SimulationConfig::new(
            vec![
                spec("A", 10, 0.0, Region::East),
                spec("B", 10, 0.0, Region::East),
                spec("C", 100, 0.0, Region::East),
            ],
            1,
        )
        .with_interaction(Interaction::new("A", "C", 0.5))
        .with_interaction(Interaction::new("B", "C", 0.5));
        let log = run(&config, ScriptedSource::never_mutates());

        let kills: Vec<u64> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                LogEvent::Predation { killed, .. } => Some(*killed),
                _ => None,
            })
            .collect();
        assert_eq!(kills, vec![50, 25]);
        assert_eq!(final_survivors(&log)[2].count, 25);
    }

    #[test]
    fn test_small_population_without_growth_survives() {
        let config = SimulationConfig::new(vec![spec("A", 5, 0.0, Region::West)], 1);
        let log = run(&config, ScriptedSource::never_mutates());

        assert_eq!(final_survivors(&log)[0].count, 5);
        assert!(!log
            .events()
            .iter()
            .any(|e| matches!(e, LogEvent::Extinction { .. })));
    }

    #[test]
    fn test_victim_wiped_out_goes_extinct() {
        let config = SimulationConfig::new(
            vec![
                spec("A", 10, 0.0, Region::North),
                spec("B", 1, 0.0, Region::North),
            ],
            1,
        )
        .with_interaction(Interaction::new("A", "B", 1.0));
        let log = run(&config, ScriptedSource::never_mutates());

        assert!(log
            .events()
            .contains(&LogEvent::Extinction { name: "B".into() }));
        let names: Vec<String> = final_survivors(&log).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["A".to_string()]);
    }

    #[test]
    fn test_stops_early_when_everything_dies() {
        // B is wiped out first but is only removed in the extinction phase,
        // so it still hunts A during the same predation phase.
        let config = SimulationConfig::new(
            vec![spec("A", 2, 0.0, Region::North), spec("B", 1, 0.0, Region::North)],
            10,
        )
        .with_interaction(Interaction::new("A", "B", 1.0))
        .with_interaction(Interaction::new("B", "A", 1.0));
        let report = Simulation::new(&config, ScriptedSource::never_mutates()).run();

        assert!(report.extinct);
        assert_eq!(report.generations_run, 1);
        assert_eq!(report.log.generation_blocks(), 1);
        let lines = report.log.lines();
        assert!(lines.contains(&"EXTINCTION: A went extinct".to_string()));
        assert!(lines.contains(&"EXTINCTION: B went extinct".to_string()));
        assert!(lines.contains(&"No population survived.".to_string()));
        assert!(lines.contains(&"All populations went extinct.".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("END"));
    }

    #[test]
    fn test_mutation_spawns_population() {
        let rng = ScriptedSource {
            units: VecDeque::from(vec![0.1]),
            ints: VecDeque::from(vec![42]),
            indices: VecDeque::from(vec![1]),
        };
        let config = SimulationConfig::new(vec![spec("A", 100, 0.0, Region::North)], 1)
            .with_mutation_chance(0.5);
        let log = run(&config, rng);

        assert!(log.events().contains(&LogEvent::Mutation {
            name: "Mutant 42".into(),
            region: Region::South,
        }));
        let mutant = final_survivors(&log)
            .into_iter()
            .find(|s| s.name == "Mutant 42")
            .unwrap();
        assert_eq!(mutant.count, MUTANT_INITIAL_COUNT);
        assert_eq!(mutant.region, Region::South);
    }

    #[test]
    fn test_mutant_grows_from_next_generation() {
        let rng = ScriptedSource {
            units: VecDeque::from(vec![0.0, 0.99]),
            ints: VecDeque::from(vec![7]),
            indices: VecDeque::from(vec![0]),
        };
        let config = SimulationConfig::new(vec![spec("A", 100, 0.0, Region::North)], 2)
            .with_mutation_chance(0.5);
        let log = run(&config, rng);

        let snapshots: Vec<Vec<SurvivorEntry>> = log.snapshots().map(|s| s.to_vec()).collect();
        // 10 individuals at 5% growth produce no offspring under truncation
        assert_eq!(snapshots[0][1].count, 10);
        assert_eq!(snapshots[1][1].count, 10);
    }

    #[test]
    fn test_mutant_name_collision_replaces_population() {
        let rng = ScriptedSource {
            units: VecDeque::from(vec![0.0]),
            ints: VecDeque::from(vec![3]),
            indices: VecDeque::from(vec![3]),
        };
        let config = SimulationConfig::new(vec![spec("Mutant 3", 500, 0.0, Region::North)], 1)
            .with_mutation_chance(1.0);
        let log = run(&config, rng);

        assert_eq!(
            final_survivors(&log),
            vec![SurvivorEntry {
                name: "Mutant 3".into(),
                count: MUTANT_INITIAL_COUNT,
                region: Region::West,
            }]
        );
    }

    #[test]
    fn test_zero_mutation_chance_never_mutates() {
        let config = SimulationConfig::new(vec![spec("A", 100, 0.0, Region::North)], 50);
        let log = run(&config, seeded_rng(1));
        assert!(!log
            .events()
            .iter()
            .any(|e| matches!(e, LogEvent::Mutation { .. })));
    }

    #[test]
    fn test_growth_saturates() {
        let mut sim = Simulation::new(
            &SimulationConfig::new(vec![spec("A", 1, 1.0, Region::North)], 1),
            ScriptedSource::never_mutates(),
        );
        if let Some(pop) = sim.populations.get_mut("A") {
            pop.count = u64::MAX - 1;
        }
        sim.generation = 1;
        sim.step();
        assert_eq!(sim.populations().next().map(|p| p.count), Some(u64::MAX));
    }

    fn arb_config() -> impl Strategy<Value = SimulationConfig> {
        let names = ["Blue", "Green", "Yellow", "Orange", "Red"];
        (
            prop::collection::vec((1u64..=1000, 0.0f64..=1.0, 0usize..4), 1..=5),
            prop::collection::vec((0usize..5, 0usize..5, 0.01f64..=1.0), 0..8),
            0.0f64..=1.0,
            1u32..=50,
        )
            .prop_map(move |(pops, links, mutation, generations)| {
                let populations: Vec<PopulationSpec> = pops
                    .iter()
                    .enumerate()
                    .map(|(i, (count, rate, region))| {
                        spec(names[i], *count, *rate, Region::ALL[*region])
                    })
                    .collect();
                let mut config = SimulationConfig::new(populations, generations)
                    .with_mutation_chance(mutation);
                let n = pops.len();
                for (a, v, fraction) in links {
                    let (a, v) = (a % n, v % n);
                    if a != v {
                        config = config
                            .with_interaction(Interaction::new(names[a], names[v], fraction));
                    }
                }
                config
            })
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_generation_count(config in arb_config(), seed in any::<u64>()) {
            let report = Simulation::new(&config, seeded_rng(seed)).run();
            prop_assert!(report.generations_run <= config.generations);
            prop_assert!(report.log.generation_blocks() <= config.generations as usize);
            if !report.extinct {
                prop_assert_eq!(report.generations_run, config.generations);
            }
        }

        #[test]
        fn prop_same_seed_same_log(config in arb_config(), seed in any::<u64>()) {
            let a = run(&config, seeded_rng(seed)).to_text();
            let b = run(&config, seeded_rng(seed)).to_text();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_predation_never_exceeds_victim(config in arb_config(), seed in any::<u64>()) {
            let mut sim = Simulation::new(&config, seeded_rng(seed));
            for generation in 1..=config.generations {
                let before: Vec<(String, u64)> = sim
                    .populations()
                    .map(|p| (p.name.clone(), p.count))
                    .collect();
                sim.generation = generation;
                sim.predation_phase();
                for (name, count) in before {
                    if let Some(p) = sim.populations.get(&name) {
                        prop_assert!(p.count <= count);
                    }
                }
                sim.reproduction_phase();
                sim.mutation_phase();
                sim.extinction_phase();
                prop_assert!(sim.populations().all(|p| p.count > 0));
                if sim.populations.is_empty() {
                    break;
                }
            }
        }

        #[test]
        fn prop_inert_generation_keeps_counts(
            counts in prop::collection::vec(1u64..=1000, 1..=5),
            generations in 1u32..=50,
            seed in any::<u64>(),
        ) {
            let names = ["Blue", "Green", "Yellow", "Orange", "Red"];
            let populations: Vec<PopulationSpec> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| spec(names[i], *c, 0.0, Region::North))
                .collect();
            let config = SimulationConfig::new(populations, generations);
            let report = Simulation::new(&config, seeded_rng(seed)).run();

            let mut expected: Vec<(String, u64)> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| (names[i].to_string(), *c))
                .collect();
            expected.sort();
            for snapshot in report.log.snapshots() {
                let seen: Vec<(String, u64)> =
                    snapshot.iter().map(|s| (s.name.clone(), s.count)).collect();
                prop_assert_eq!(&seen, &expected);
            }
        }

        #[test]
        fn prop_extinct_names_stay_gone(config in arb_config(), seed in any::<u64>()) {
            let log = run(&config, seeded_rng(seed));
            let mut gone: HashSet<String> = HashSet::new();
            for event in log.events() {
                match event {
                    LogEvent::Extinction { name } => {
                        gone.insert(name.clone());
                    }
                    LogEvent::Mutation { name, .. } => {
                        // a mutant may legitimately reuse a dead mutant's name
                        gone.remove(name);
                    }
                    LogEvent::Snapshot { survivors } => {
                        for s in survivors {
                            prop_assert!(!gone.contains(&s.name));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
