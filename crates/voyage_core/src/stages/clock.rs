use async_trait::async_trait;
use tracing::info;

use crate::scratch::ScratchRequest;
use crate::stage::{Next, Stage, StageMetadata, StageResult};
use crate::state::GameState;

pub const STAGE: StageMetadata = StageMetadata {
    id: "time-advancer",
    name: "TimeAdvancer",
    version: "1.0.0",
};

/// One in-world hour.
pub const STEP_SECONDS: u64 = 3_600;

/// Moves the game clock forward by a fixed amount on every step.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeAdvancer;

#[async_trait]
impl Stage for TimeAdvancer {
    fn metadata(&self) -> StageMetadata {
        STAGE
    }

    async fn process(
        &self,
        scratch: &mut ScratchRequest,
        state: &mut GameState,
        next: Next<'_>,
    ) -> StageResult {
        let before = state.game_time();
        let after = state.advance_clock(STEP_SECONDS);
        info!(before, after, "advanced game time");
        next.run(scratch, state).await
    }
}
