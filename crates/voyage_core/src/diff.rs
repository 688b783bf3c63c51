use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::state::ContextField;

/// Sparse set of field changes. `None` deletes the field, `Some` creates or
/// replaces it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextChanges(BTreeMap<String, Option<ContextField>>);

impl ContextChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a change map produced by the narrator.
    ///
    /// `null` entries become deletions and well-formed records become upserts.
    /// Anything else is dropped; the dropped keys are returned so callers can
    /// log them. A `changes` value that is not an object yields no changes.
    pub fn from_lenient(changes: Option<&Value>) -> (Self, Vec<String>) {
        let mut parsed = Self::new();
        let mut dropped = Vec::new();
        let map = match changes {
            None | Some(Value::Null) => return (parsed, dropped),
            Some(Value::Object(map)) => map,
            Some(other) => {
                warn!(kind = ?other, "context changes are not an object; ignoring");
                return (parsed, dropped);
            }
        };

        for (key, value) in map {
            if value.is_null() {
                parsed.delete(key.clone());
                continue;
            }
            match serde_json::from_value::<ContextField>(value.clone()) {
                Ok(field) => parsed.upsert(key.clone(), field),
                Err(err) => {
                    warn!(field = %key, %err, "dropping malformed context change");
                    dropped.push(key.clone());
                }
            }
        }
        (parsed, dropped)
    }

    pub fn upsert(&mut self, key: impl Into<String>, field: ContextField) {
        self.0.insert(key.into(), Some(field));
    }

    pub fn delete(&mut self, key: impl Into<String>) {
        self.0.insert(key.into(), None);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Option<ContextField>> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ContextField>)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_ref()))
    }
}

/// Narrative outcome of one step together with the state changes it caused.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub description: String,
    #[serde(default)]
    pub context_changes: ContextChanges,
}

impl Event {
    pub fn narrative(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            context_changes: ContextChanges::new(),
        }
    }
}
