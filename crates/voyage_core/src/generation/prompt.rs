use std::collections::BTreeMap;

use crate::generation::{GenerationRequest, SchemaField, SummaryPayload, CONTEXT_CHANGES, EVENT_DESCRIPTION};
use crate::scratch::{InputType, PreLogSummary};
use crate::state::GameState;

/// Standing instructions for the narrator.
pub const BASE_PROMPT: &str = "You are the narrator of a text survival adventure. \
The player is stranded on an unknown planet after a crash landing. \
Keep the world consistent with the current context fields and the recent history. \
Respond only with the requested JSON fields.";

const ACTION_DIRECTIVE: &str = "Generate an event describing what happens in the game world \
as a result of the player's action. Update only the context fields that change.";

const QUESTION_DIRECTIVE: &str = "Understand the player's feedback about game mechanics and \
generate an event that reflects the adjustment to the game world. Update context fields \
according to the player's suggestions.";

pub fn directive(input_type: InputType) -> &'static str {
    match input_type {
        InputType::Action => ACTION_DIRECTIVE,
        InputType::Question => QUESTION_DIRECTIVE,
    }
}

/// Output schema: a narrative description and a sparse change map.
pub fn event_schema() -> BTreeMap<String, SchemaField> {
    BTreeMap::from([
        (
            EVENT_DESCRIPTION.to_string(),
            SchemaField {
                kind: "string".to_string(),
                description: "Narrative description of what happens in the game world. \
Should be 3-5 sentences, vivid and immersive, directly responding to the player action."
                    .to_string(),
            },
        ),
        (
            CONTEXT_CHANGES.to_string(),
            SchemaField {
                kind: "object".to_string(),
                description: "Object containing only the context fields that changed. \
Each field should have {value, type, description}. Use null to remove a field."
                    .to_string(),
            },
        ),
    ])
}

pub fn build_request(
    base_prompt: &str,
    state: &GameState,
    user_input: &str,
    input_type: InputType,
    summary: Option<&PreLogSummary>,
    model: Option<&str>,
) -> GenerationRequest {
    GenerationRequest {
        prompt: format!("{}\n\n{}", base_prompt, directive(input_type)),
        context: state.fields().clone(),
        pre_log_summary: summary.map(SummaryPayload::from),
        user_input: user_input.to_string(),
        schema: event_schema(),
        stream: false,
        model: model.map(str::to_string),
    }
}
