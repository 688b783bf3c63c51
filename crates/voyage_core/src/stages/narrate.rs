use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::{StageError, UpstreamError};
use crate::generation::prompt::{build_request, BASE_PROMPT};
use crate::generation::GenerationService;
use crate::reduce::apply;
use crate::scratch::ScratchRequest;
use crate::stage::{Next, Stage, StageMetadata, StageResult};
use crate::state::GameState;

pub const STAGE: StageMetadata = StageMetadata {
    id: "event-generator",
    name: "EventGenerator",
    version: "1.0.0",
};

/// Asks the generation service for the next event and commits its changes.
///
/// This is the last stage of a step-processing chain. A failed, timed-out or
/// rejected call aborts the chain and is never retried here.
pub struct EventGenerator {
    service: Arc<dyn GenerationService>,
    timeout: Duration,
    base_prompt: String,
    model: Option<String>,
}

impl EventGenerator {
    pub fn new(service: Arc<dyn GenerationService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            base_prompt: BASE_PROMPT.to_string(),
            model: None,
        }
    }

    pub fn with_base_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.base_prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl Stage for EventGenerator {
    fn metadata(&self) -> StageMetadata {
        STAGE
    }

    async fn process(
        &self,
        scratch: &mut ScratchRequest,
        state: &mut GameState,
        next: Next<'_>,
    ) -> StageResult {
        let user_input = scratch
            .user_input
            .as_deref()
            .ok_or(StageError::MissingScratch("userInput"))?;
        let input_type = scratch
            .input_type
            .ok_or(StageError::MissingScratch("inputType"))?;
        info!(input = user_input, %input_type, "generating event");

        let request = build_request(
            &self.base_prompt,
            state,
            user_input,
            input_type,
            scratch.pre_log_summary.as_ref(),
            self.model.as_deref(),
        );
        let response = match tokio::time::timeout(self.timeout, self.service.generate(&request)).await {
            Ok(response) => response?,
            Err(_) => {
                error!(timeout_ms = self.timeout.as_millis() as u64, "generation timed out");
                return Err(UpstreamError::Timeout(self.timeout).into());
            }
        };
        if !response.success {
            error!(
                code = response.error_code.as_deref().unwrap_or("UNKNOWN"),
                message = %response.message,
                fix = response.fix_suggestion.as_deref().unwrap_or(""),
                issues = ?response.validation_errors,
                "generation rejected"
            );
        }

        let generated = response.into_generated()?;
        if !generated.dropped.is_empty() {
            warn!(dropped = ?generated.dropped, "ignored malformed context changes");
        }
        let applied = apply(state, &generated.event.context_changes);
        info!(
            upserted = applied.upserted,
            removed = applied.removed,
            fields = state.field_count(),
            "event generated"
        );
        scratch.event = Some(generated.event);
        next.run(scratch, state).await
    }
}
