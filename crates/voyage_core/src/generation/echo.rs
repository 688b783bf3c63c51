use async_trait::async_trait;
use serde_json::json;

use crate::error::UpstreamError;
use crate::generation::{
    GenerationRequest, GenerationResponse, GenerationService, CONTEXT_CHANGES, EVENT_DESCRIPTION,
};

/// Offline narrator that restates the player's input and changes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoGenerator;

#[async_trait]
impl GenerationService for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, UpstreamError> {
        Ok(GenerationResponse::succeeded(json!({
            EVENT_DESCRIPTION: format!("You {}. The environment responds accordingly.", request.user_input),
            CONTEXT_CHANGES: {},
        })))
    }
}
