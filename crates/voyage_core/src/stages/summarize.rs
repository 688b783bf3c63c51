use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::scratch::{PreLogSummary, ScratchRequest};
use crate::stage::{Next, Stage, StageMetadata, StageResult};
use crate::state::GameState;
use crate::step::{now_millis, Step};
use crate::store::StepStore;

pub const STAGE: StageMetadata = StageMetadata {
    id: "history-summarizer",
    name: "HistorySummarizer",
    version: "1.0.0",
};

pub const EMPTY_HISTORY_SUMMARY: &str = "No earlier events. The adventure is just beginning.";

/// Condenses the most recent steps of the session into a [`PreLogSummary`].
pub struct HistorySummarizer {
    steps: Arc<dyn StepStore>,
    window: usize,
}

impl HistorySummarizer {
    pub fn new(steps: Arc<dyn StepStore>, window: usize) -> Self {
        Self { steps, window }
    }

    /// `recent` is oldest first; `total` is the session's full history length.
    pub fn summarize(recent: &[Step], total: usize, generated_at: i64) -> PreLogSummary {
        let Some(latest) = recent.last() else {
            return PreLogSummary {
                summary: EMPTY_HISTORY_SUMMARY.to_string(),
                recent_events: Vec::new(),
                generated_at,
            };
        };

        let hours = latest.context.game_time() / 3_600;
        let location = latest
            .context
            .get("location")
            .and_then(|field| field.value.as_str())
            .map(|place| format!(" at {place}"))
            .unwrap_or_default();
        PreLogSummary {
            summary: format!(
                "{total} step(s) so far, {hours} hour(s) in{location}. Last input: \"{}\".",
                latest.user_input
            ),
            recent_events: recent
                .iter()
                .map(|step| step.event.description.clone())
                .collect(),
            generated_at,
        }
    }
}

#[async_trait]
impl Stage for HistorySummarizer {
    fn metadata(&self) -> StageMetadata {
        STAGE
    }

    async fn process(
        &self,
        scratch: &mut ScratchRequest,
        state: &mut GameState,
        next: Next<'_>,
    ) -> StageResult {
        let history = scratch.history();
        let recent = self.steps.recent(history, self.window).await?;
        let summary = Self::summarize(&recent, history.len(), now_millis());
        info!(
            history = history.len(),
            recent = summary.recent_events.len(),
            "history summarized"
        );
        scratch.pre_log_summary = Some(summary);
        next.run(scratch, state).await
    }
}
