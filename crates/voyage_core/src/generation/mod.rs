//! Contract with the external narrative generation service.

pub mod echo;
pub mod prompt;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::{ContextChanges, Event};
use crate::error::UpstreamError;
use crate::scratch::PreLogSummary;
use crate::state::ContextField;

pub use echo::EchoGenerator;
pub use prompt::build_request;

/// Output field carrying the narrative text.
pub const EVENT_DESCRIPTION: &str = "event_description";
/// Output field carrying the sparse state changes.
pub const CONTEXT_CHANGES: &str = "context_changes";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub summary: String,
    pub recent_events: Vec<String>,
}

impl From<&PreLogSummary> for SummaryPayload {
    fn from(summary: &PreLogSummary) -> Self {
        Self {
            summary: summary.summary.clone(),
            recent_events: summary.recent_events.clone(),
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub context: BTreeMap<String, ContextField>,
    pub pre_log_summary: Option<SummaryPayload>,
    pub user_input: String,
    pub schema: BTreeMap<String, SchemaField>,
    pub stream: bool,
    pub model: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub expected: String,
    pub received: String,
}

/// Response envelope. `result` stays loosely typed so that imprecise model
/// output can be salvaged field by field.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub result: Option<Value>,
    pub error_code: Option<String>,
    pub validation_errors: Option<Vec<ValidationIssue>>,
    pub fix_suggestion: Option<String>,
}

/// An event decoded from a successful response.
#[derive(Clone, Debug, PartialEq)]
pub struct Generated {
    pub event: Event,
    /// Change keys dropped because their records were malformed.
    pub dropped: Vec<String>,
}

impl GenerationResponse {
    pub fn succeeded(result: Value) -> Self {
        Self {
            success: true,
            message: "Generation completed".to_string(),
            result: Some(result),
            error_code: None,
            validation_errors: None,
            fix_suggestion: None,
        }
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            result: None,
            error_code: Some(code.into()),
            validation_errors: None,
            fix_suggestion: None,
        }
    }

    /// Turn the envelope into an event.
    ///
    /// `success = false` and a missing or blank description are fatal.
    /// Malformed change entries are dropped.
    pub fn into_generated(self) -> Result<Generated, UpstreamError> {
        if !self.success {
            return Err(UpstreamError::Rejected {
                code: self.error_code.unwrap_or_else(|| "UNKNOWN".to_string()),
                message: self.message,
            });
        }
        let result = self.result.ok_or(UpstreamError::MissingDescription)?;
        let description = result
            .get(EVENT_DESCRIPTION)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(UpstreamError::MissingDescription)?
            .to_string();
        let (context_changes, dropped) = ContextChanges::from_lenient(result.get(CONTEXT_CHANGES));
        Ok(Generated {
            event: Event {
                description,
                context_changes,
            },
            dropped,
        })
    }
}

/// The narrative generation backend.
///
/// Implementations report every failure as an [`UpstreamError`] and must not
/// retry on the caller's behalf unless that is their documented policy.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, UpstreamError>;

    /// Whether the backend currently answers. Never fatal.
    async fn health(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_with_changes_decodes_event() {
        let response = GenerationResponse::succeeded(json!({
            "event_description": "  You sip recycled water.  ",
            "context_changes": {
                "thirst": {"value": 20, "type": "number", "description": "Thirst level"},
                "bogus": "high"
            }
        }));
        let generated = response.into_generated().expect("event decodes");
        assert_eq!(generated.event.description, "You sip recycled water.");
        assert_eq!(generated.event.context_changes.len(), 1);
        assert_eq!(generated.dropped, vec!["bogus".to_string()]);
    }

    #[test]
    fn explicit_failure_is_rejected_with_code() {
        let err = GenerationResponse::failed("CONTEXT_TOO_LARGE", "too many fields")
            .into_generated()
            .unwrap_err();
        assert_eq!(
            err,
            UpstreamError::Rejected {
                code: "CONTEXT_TOO_LARGE".into(),
                message: "too many fields".into()
            }
        );
    }

    #[test]
    fn blank_or_missing_description_is_fatal() {
        for result in [
            json!({"context_changes": {}}),
            json!({"event_description": "   "}),
            json!({"event_description": 7}),
        ] {
            let err = GenerationResponse::succeeded(result).into_generated().unwrap_err();
            assert_eq!(err, UpstreamError::MissingDescription);
        }
        let mut bare = GenerationResponse::succeeded(json!({}));
        bare.result = None;
        assert_eq!(bare.into_generated().unwrap_err(), UpstreamError::MissingDescription);
    }

    #[test]
    fn response_parses_service_envelope() {
        let raw = json!({
            "success": false,
            "message": "Generated data does not match required schema",
            "error_code": "SCHEMA_VALIDATION_FAILED",
            "validation_errors": [{"field": "event_description", "expected": "string (required)", "received": "missing"}],
            "fix_suggestion": "Add required field 'event_description'"
        });
        let response: GenerationResponse = serde_json::from_value(raw).expect("envelope parses");
        assert_eq!(response.validation_errors.as_ref().map(Vec::len), Some(1));
        assert!(response.result.is_none());
    }
}
