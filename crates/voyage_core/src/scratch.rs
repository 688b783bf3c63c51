use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::Event;

/// How the player's input is framed for the narrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// An in-world action or thought.
    Action,
    /// Feedback about the rules or mechanics of the game.
    Question,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Action => "action",
            InputType::Question => "question",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condensed view of recent history handed to the narrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreLogSummary {
    pub summary: String,
    pub recent_events: Vec<String>,
    pub generated_at: i64,
}

/// Per-request working data threaded through the pipeline.
///
/// Built fresh for every request and consumed when the step is assembled.
#[derive(Clone, Debug, Default)]
pub struct ScratchRequest {
    input: String,
    history: Vec<String>,
    pub user_input: Option<String>,
    pub input_type: Option<InputType>,
    pub event: Option<Event>,
    pub pre_log_summary: Option<PreLogSummary>,
}

impl ScratchRequest {
    /// `history` is the session's ordered step ids, oldest first.
    pub fn new(input: impl Into<String>, history: Vec<String>) -> Self {
        Self {
            input: input.into(),
            history,
            ..Self::default()
        }
    }

    /// The raw text exactly as the player submitted it.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}
