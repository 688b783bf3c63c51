use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Declared type tag of a context field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    String,
    Object,
    Array,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::String => "string",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a context field. The variant is the type tag, so a record can never
/// claim one type while carrying another.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Number(Number),
    String(String),
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Object(_) => FieldKind::Object,
            FieldValue::Array(_) => FieldKind::Array,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(text) => Some(text),
            _ => None,
        }
    }

    fn into_json(self) -> Value {
        match self {
            FieldValue::Number(number) => Value::Number(number),
            FieldValue::String(text) => Value::String(text),
            FieldValue::Object(map) => Value::Object(map),
            FieldValue::Array(items) => Value::Array(items),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("field declared as {declared} but value is {actual}")]
    TypeMismatch {
        declared: FieldKind,
        actual: &'static str,
    },
}

/// A single typed entry of the game state.
///
/// On the wire this is `{value, type, description?}`; decoding rejects any
/// record whose `type` does not match the JSON shape of `value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct ContextField {
    pub value: FieldValue,
    pub description: Option<String>,
}

impl ContextField {
    pub fn new(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    pub fn described(value: impl Into<FieldValue>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: Some(description.into()),
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }
}

#[derive(Serialize, Deserialize)]
struct RawField {
    value: Value,
    #[serde(rename = "type")]
    kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl TryFrom<RawField> for ContextField {
    type Error = FieldError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let value = match (raw.kind, raw.value) {
            (FieldKind::Number, Value::Number(number)) => FieldValue::Number(number),
            (FieldKind::String, Value::String(text)) => FieldValue::String(text),
            (FieldKind::Object, Value::Object(map)) => FieldValue::Object(map),
            (FieldKind::Array, Value::Array(items)) => FieldValue::Array(items),
            (declared, other) => {
                return Err(FieldError::TypeMismatch {
                    declared,
                    actual: json_kind(&other),
                })
            }
        };
        Ok(Self {
            value,
            description: raw.description,
        })
    }
}

impl From<ContextField> for RawField {
    fn from(field: ContextField) -> Self {
        Self {
            kind: field.value.kind(),
            value: field.value.into_json(),
            description: field.description,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Mutable game state: named typed fields plus the in-world clock (seconds).
///
/// The clock only moves forward. The field-count bound is enforced by the
/// validation stage, not here, so an oversized state can still be loaded and
/// reported.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    state: BTreeMap<String, ContextField>,
    game_time: u64,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, field: ContextField) -> Self {
        self.state.insert(key.into(), field);
        self
    }

    pub fn game_time(&self) -> u64 {
        self.game_time
    }

    /// Move the clock forward by `seconds`, returning the new time.
    pub fn advance_clock(&mut self, seconds: u64) -> u64 {
        self.game_time = self.game_time.saturating_add(seconds);
        self.game_time
    }

    pub fn field_count(&self) -> usize {
        self.state.len()
    }

    pub fn get(&self, key: &str) -> Option<&ContextField> {
        self.state.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// Insert or fully replace the record stored under `key`.
    pub fn upsert(&mut self, key: impl Into<String>, field: ContextField) -> Option<ContextField> {
        self.state.insert(key.into(), field)
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextField> {
        self.state.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, ContextField> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_round_trips_wire_shape() {
        let field = ContextField::described(42, "answer");
        let value = serde_json::to_value(&field).expect("field serializes");
        assert_eq!(
            value,
            json!({"value": 42, "type": "number", "description": "answer"})
        );
        let back: ContextField = serde_json::from_value(value).expect("field parses");
        assert_eq!(back, field);
    }

    #[test]
    fn description_is_omitted_when_absent() {
        let value = serde_json::to_value(ContextField::new("cave")).expect("field serializes");
        assert_eq!(value, json!({"value": "cave", "type": "string"}));
    }

    #[test]
    fn mismatched_tag_is_rejected() {
        let err = serde_json::from_value::<ContextField>(json!({"value": "ten", "type": "number"}))
            .unwrap_err();
        assert!(err.to_string().contains("declared as number but value is string"));
    }

    #[test]
    fn unknown_tag_and_missing_value_are_rejected() {
        assert!(serde_json::from_value::<ContextField>(json!({"value": true, "type": "boolean"})).is_err());
        assert!(serde_json::from_value::<ContextField>(json!({"type": "number"})).is_err());
        assert!(serde_json::from_value::<ContextField>(json!({"value": null, "type": "object"})).is_err());
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut state = GameState::new();
        assert_eq!(state.advance_clock(3_600), 3_600);
        assert_eq!(state.advance_clock(0), 3_600);
        state.game_time = u64::MAX - 1;
        assert_eq!(state.advance_clock(10), u64::MAX);
    }

    #[test]
    fn state_serializes_camel_case() {
        let state = GameState::new().with_field("health", ContextField::new(100));
        let value = serde_json::to_value(&state).expect("state serializes");
        assert_eq!(
            value,
            json!({"state": {"health": {"value": 100, "type": "number"}}, "gameTime": 0})
        );
    }
}
