use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::StageError;
use crate::scratch::ScratchRequest;
use crate::stage::{Next, Stage, StageMetadata, StageResult};
use crate::state::GameState;

pub const STAGE: StageMetadata = StageMetadata {
    id: "state-validator",
    name: "StateValidator",
    version: "1.0.0",
};

/// Rejects a state holding more fields than allowed. Never mutates.
///
/// Must sit after every stage that can change the field count and before the
/// narrator, so an oversized state never costs a generation call.
#[derive(Clone, Copy, Debug)]
pub struct StateValidator {
    max_fields: usize,
}

impl StateValidator {
    pub fn new(max_fields: usize) -> Self {
        Self { max_fields }
    }

    pub fn check(&self, state: &GameState) -> Result<(), StageError> {
        let count = state.field_count();
        if count > self.max_fields {
            return Err(StageError::FieldLimitExceeded {
                count,
                limit: self.max_fields,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for StateValidator {
    fn metadata(&self) -> StageMetadata {
        STAGE
    }

    async fn process(
        &self,
        scratch: &mut ScratchRequest,
        state: &mut GameState,
        next: Next<'_>,
    ) -> StageResult {
        if let Err(err) = self.check(state) {
            error!(%err, "state rejected");
            return Err(err);
        }
        debug!(
            fields = state.field_count(),
            keys = ?state.keys().collect::<Vec<_>>(),
            "state within limits"
        );
        next.run(scratch, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ContextField;

    fn state_with(count: usize) -> GameState {
        (0..count).fold(GameState::new(), |state, index| {
            state.with_field(format!("field_{index}"), ContextField::new(index as i64))
        })
    }

    #[test]
    fn at_the_limit_is_accepted() {
        let validator = StateValidator::new(16);
        assert!(validator.check(&state_with(0)).is_ok());
        assert!(validator.check(&state_with(16)).is_ok());
    }

    #[test]
    fn over_the_limit_reports_count_and_limit() {
        let validator = StateValidator::new(16);
        let state = state_with(17);
        let err = validator.check(&state).unwrap_err();
        assert_eq!(err, StageError::FieldLimitExceeded { count: 17, limit: 16 });
        assert_eq!(state, state_with(17));
    }
}
