use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::diff::Event;
use crate::scratch::{InputType, PreLogSummary};
use crate::state::{ContextField, GameState};
use crate::step::{now_millis, Step};

/// Input recorded on the first step of every game.
pub const GAME_START_INPUT: &str = "[GAME_START]";

/// Starting conditions of a new game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    /// Narrative shown on the opening step.
    pub opening: String,
    /// History summary attached to the opening step.
    pub summary: String,
    pub context: GameState,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::crashed_spaceship()
    }
}

impl Scenario {
    pub fn crashed_spaceship() -> Self {
        let context = GameState::new()
            .with_field("health", ContextField::described(100, "Health points"))
            .with_field("hunger", ContextField::described(50, "Hunger level"))
            .with_field("thirst", ContextField::described(50, "Thirst level"))
            .with_field("energy", ContextField::described(80, "Energy level"))
            .with_field(
                "location",
                ContextField::described("Crashed Spaceship", "Current location"),
            );
        Self {
            name: "Crashed Spaceship".to_string(),
            opening: "Your spacecraft crashes during an emergency landing on an unknown planet. \
Alarms blare inside the cabin, and oxygen levels are dropping. You must find a way to survive \
and escape this desolate world."
                .to_string(),
            summary: "Game starts. Player awakens in a crashed spaceship.".to_string(),
            context,
        }
    }

    /// Load a scenario JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open scenario file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let scenario: Self = serde_json::from_reader(reader).context("invalid scenario json")?;
        ensure!(
            !scenario.opening.trim().is_empty(),
            "scenario {:?} has an empty opening narrative",
            scenario.name
        );
        Ok(scenario)
    }

    pub fn initial_state(&self) -> GameState {
        self.context.clone()
    }

    /// The first step of a game played from this scenario.
    pub fn opening_step(&self) -> Step {
        Step::new(
            GAME_START_INPUT,
            InputType::Action,
            self.initial_state(),
            Event::narrative(self.opening.clone()),
            PreLogSummary {
                summary: self.summary.clone(),
                recent_events: Vec::new(),
                generated_at: now_millis(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FieldKind;

    #[test]
    fn crashed_spaceship_has_five_fields_at_time_zero() {
        let state = Scenario::crashed_spaceship().initial_state();
        assert_eq!(state.game_time(), 0);
        assert_eq!(state.field_count(), 5);
        for (key, value) in [("health", 100), ("hunger", 50), ("thirst", 50), ("energy", 80)] {
            let field = state.get(key).expect("field present");
            assert_eq!(field.kind(), FieldKind::Number);
            assert_eq!(field.value.as_i64(), Some(value));
        }
        assert_eq!(
            state.get("location").and_then(|field| field.value.as_str()),
            Some("Crashed Spaceship")
        );
    }

    #[test]
    fn opening_step_is_an_action_with_no_changes() {
        let step = Scenario::default().opening_step();
        assert_eq!(step.user_input, GAME_START_INPUT);
        assert_eq!(step.input_type, InputType::Action);
        assert!(step.event.context_changes.is_empty());
        assert!(step.pre_log_summary.recent_events.is_empty());
    }

    #[test]
    fn scenario_documents_round_trip() {
        let text = serde_json::to_string(&Scenario::crashed_spaceship()).expect("serializes");
        let parsed = Scenario::from_reader(text.as_bytes()).expect("parses");
        assert_eq!(parsed, Scenario::crashed_spaceship());
    }

    #[test]
    fn blank_opening_is_rejected() {
        let doc = r#"{
            "name": "void",
            "opening": "  ",
            "summary": "",
            "context": {"state": {}, "gameTime": 0}
        }"#;
        let err = Scenario::from_reader(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("empty opening"));
    }

    #[test]
    fn repository_scenarios_load() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../testdata/scenarios/derelict_station.json");
        let scenario = Scenario::load_from_path(&path)
            .unwrap_or_else(|err| panic!("failed to load {:?}: {}", path, err));
        assert!(scenario.context.field_count() > 0);
    }
}
