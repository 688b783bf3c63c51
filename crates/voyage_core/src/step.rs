use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::Event;
use crate::scratch::{InputType, PreLogSummary};
use crate::state::GameState;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One immutable entry of game history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub timestamp: i64,
    pub user_input: String,
    pub input_type: InputType,
    pub context: GameState,
    pub event: Event,
    pub pre_log_summary: PreLogSummary,
}

impl Step {
    pub fn new(
        user_input: impl Into<String>,
        input_type: InputType,
        context: GameState,
        event: Event,
        pre_log_summary: PreLogSummary,
    ) -> Self {
        Self {
            id: new_id(),
            timestamp: now_millis(),
            user_input: user_input.into(),
            input_type,
            context,
            event,
            pre_log_summary,
        }
    }

    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// A player's game: the ordered step ids plus a pointer to the latest one.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub created_at: i64,
    pub last_accessed_at: i64,
    pub current_step_id: Option<String>,
    pub step_history: Vec<String>,
}

impl Session {
    pub fn new(now: i64) -> Self {
        Self {
            session_id: new_id(),
            created_at: now,
            last_accessed_at: now,
            current_step_id: None,
            step_history: Vec::new(),
        }
    }

    pub fn touch(&mut self, now: i64) {
        self.last_accessed_at = self.last_accessed_at.max(now);
    }

    pub fn advance(&mut self, step_id: &str, now: i64) {
        self.current_step_id = Some(step_id.to_string());
        self.step_history.push(step_id.to_string());
        self.touch(now);
    }

    pub fn is_expired(&self, now: i64, ttl_millis: i64) -> bool {
        now.saturating_sub(self.last_accessed_at) > ttl_millis
    }
}
