//! Run log: the ordered events a simulation produces and their text rendering.

use popsim_core::Region;
use serde::{Deserialize, Serialize};

/// One surviving population as listed in a generation snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorEntry {
    pub name: String,
    pub count: u64,
    pub region: Region,
}

/// A notable occurrence during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    Started { populations: Vec<String> },
    GenerationHeader { generation: u32 },
    Predation {
        attacker: String,
        victim: String,
        killed: u64,
        region: Region,
    },
    Mutation { name: String, region: Region },
    Extinction { name: String },
    /// Survivors ordered by name; empty when nothing survived
    Snapshot { survivors: Vec<SurvivorEntry> },
    AllExtinct,
    Finished,
}

impl LogEvent {
    /// Append the text lines for this event
    pub fn render_into(&self, out: &mut Vec<String>) {
        match self {
            LogEvent::Started { populations } => out.push(format!(
                "SIMULATION STARTED WITH POPULATIONS: {}",
                populations.join(", ")
            )),
            LogEvent::GenerationHeader { generation } => {
                out.push(String::new());
                out.push(format!("Generation {}", generation));
            }
            LogEvent::Predation {
                attacker,
                victim,
                killed,
                region,
            } => out.push(format!(
                "{} eliminated {} of {} in {}",
                attacker, killed, victim, region
            )),
            LogEvent::Mutation { name, region } => out.push(format!(
                "MUTATION: new population '{}' appeared in region {}",
                name, region
            )),
            LogEvent::Extinction { name } => out.push(format!("EXTINCTION: {} went extinct", name)),
            LogEvent::Snapshot { survivors } => {
                out.push(String::new());
                out.push("Current populations:".to_string());
                if survivors.is_empty() {
                    out.push("No population survived.".to_string());
                }
                for s in survivors {
                    out.push(format!(
                        "{}: {} individuals | Region: {}",
                        s.name, s.count, s.region
                    ));
                }
            }
            LogEvent::AllExtinct => {
                out.push(String::new());
                out.push("All populations went extinct.".to_string());
            }
            LogEvent::Finished => {
                out.push(String::new());
                out.push("END".to_string());
            }
        }
    }
}

/// Append-only record of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationLog {
    events: Vec<LogEvent>,
}

impl SimulationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.events.len() * 2);
        for event in &self.events {
            event.render_into(&mut out);
        }
        out
    }

    pub fn to_text(&self) -> String {
        self.lines().join("\n")
    }

    /// Number of generations that produced a block in the log
    pub fn generation_blocks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LogEvent::GenerationHeader { .. }))
            .count()
    }

    /// Survivor lists in generation order
    pub fn snapshots(&self) -> impl Iterator<Item = &[SurvivorEntry]> {
        self.events.iter().filter_map(|e| match e {
            LogEvent::Snapshot { survivors } => Some(survivors.as_slice()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_generation_block() {
        let mut log = SimulationLog::new();
        log.push(LogEvent::Started {
            populations: vec!["Blue".into(), "Red".into()],
        });
        log.push(LogEvent::GenerationHeader { generation: 1 });
        log.push(LogEvent::Predation {
            attacker: "Blue".into(),
            victim: "Red".into(),
            killed: 25,
            region: Region::North,
        });
        log.push(LogEvent::Snapshot {
            survivors: vec![SurvivorEntry {
                name: "Blue".into(),
                count: 100,
                region: Region::North,
            }],
        });
        log.push(LogEvent::Finished);

        assert_eq!(
            log.lines(),
            vec![
                "SIMULATION STARTED WITH POPULATIONS: Blue, Red",
                "",
                "Generation 1",
                "Blue eliminated 25 of Red in North",
                "",
                "Current populations:",
                "Blue: 100 individuals | Region: North",
                "",
                "END",
            ]
        );
        assert_eq!(log.generation_blocks(), 1);
    }

    #[test]
    fn test_render_empty_snapshot() {
        let mut out = Vec::new();
        LogEvent::Snapshot { survivors: vec![] }.render_into(&mut out);
        assert_eq!(out, vec!["", "Current populations:", "No population survived."]);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_string(&LogEvent::Extinction { name: "Red".into() }).unwrap();
        assert_eq!(json, r#"{"kind":"extinction","name":"Red"}"#);
    }
}
