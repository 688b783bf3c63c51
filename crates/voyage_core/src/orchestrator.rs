use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::CoreConfig;
use crate::error::{GameError, StoreError};
use crate::generation::GenerationService;
use crate::pipeline::Pipeline;
use crate::scenario::Scenario;
use crate::scratch::ScratchRequest;
use crate::stages::{EventGenerator, HistorySummarizer, InputClassifier, StateValidator, TimeAdvancer};
use crate::state::GameState;
use crate::step::{Session, Step};
use crate::store::{SessionStore, StepStore};

/// Result of starting a game or playing a step.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: Step,
    pub session_id: String,
}

/// Runs one player step end to end: load state, run the chain, persist.
///
/// Holds no per-request state; a fresh [`Pipeline`] is built for every step.
/// Callers must not run two steps of the same session concurrently.
pub struct Orchestrator {
    config: CoreConfig,
    steps: Arc<dyn StepStore>,
    sessions: Arc<dyn SessionStore>,
    generator: Arc<dyn GenerationService>,
    scenario: Scenario,
}

impl Orchestrator {
    pub fn new(
        config: CoreConfig,
        steps: Arc<dyn StepStore>,
        sessions: Arc<dyn SessionStore>,
        generator: Arc<dyn GenerationService>,
    ) -> Self {
        Self {
            config,
            steps,
            sessions,
            generator,
            scenario: Scenario::default(),
        }
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// The step-processing chain, in execution order.
    pub fn build_pipeline(&self) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline
            .register(InputClassifier::default())
            .register(TimeAdvancer)
            .register(StateValidator::new(self.config.max_context_fields))
            .register(HistorySummarizer::new(
                Arc::clone(&self.steps),
                self.config.history_window,
            ))
            .register(
                EventGenerator::new(Arc::clone(&self.generator), self.config.generation_timeout)
                    .with_model(self.config.model.clone()),
            );
        pipeline
    }

    /// Open a session and record the scenario's opening step.
    ///
    /// A scenario holding more fields than allowed is refused before any
    /// session exists.
    pub async fn start_game(&self) -> Result<StepOutcome, GameError> {
        StateValidator::new(self.config.max_context_fields).check(&self.scenario.context)?;
        let session = self.sessions.create().await?;
        let step = self.scenario.opening_step();
        self.commit(&session.session_id, &step).await?;
        info!(session = %session.session_id, step = %step.id, scenario = %self.scenario.name, "game started");
        Ok(StepOutcome {
            step,
            session_id: session.session_id,
        })
    }

    /// Play `input` against the session's current state.
    ///
    /// Any failure leaves both stores untouched.
    pub async fn process_step(&self, session_id: &str, input: &str) -> Result<StepOutcome, GameError> {
        if input.trim().is_empty() {
            return Err(GameError::InvalidInput("input is required".to_string()));
        }
        let session = self.require_session(session_id).await?;
        let mut state = self.load_state(&session).await?;
        let mut scratch = ScratchRequest::new(input, session.step_history.clone());

        let flow = self
            .build_pipeline()
            .execute(&mut scratch, &mut state)
            .await?;
        let step = assemble(scratch, state)?;
        self.commit(session_id, &step).await?;
        info!(
            session = session_id,
            step = %step.id,
            ?flow,
            game_time = step.context.game_time(),
            "step processed"
        );
        Ok(StepOutcome {
            step,
            session_id: session_id.to_string(),
        })
    }

    /// State after the session's latest step.
    pub async fn current_context(&self, session_id: &str) -> Result<GameState, GameError> {
        let session = self.require_session(session_id).await?;
        self.load_state(&session).await
    }

    /// Every step of the session, oldest first.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Step>, GameError> {
        self.require_session(session_id).await?;
        let ids = self.sessions.history(session_id).await?;
        Ok(self.steps.list(&ids).await?)
    }

    /// Drop idle sessions together with their steps. Returns the number of
    /// sessions removed.
    pub async fn reap_sessions(&self) -> Result<usize, GameError> {
        let reaped = self.sessions.reap_expired(self.config.session_ttl).await?;
        let mut removed_steps = 0;
        for session in &reaped {
            for step_id in &session.step_history {
                if self.steps.delete(step_id).await? {
                    removed_steps += 1;
                }
            }
        }
        if !reaped.is_empty() {
            info!(sessions = reaped.len(), steps = removed_steps, "reaped idle sessions");
        }
        Ok(reaped.len())
    }

    pub async fn generator_healthy(&self) -> bool {
        self.generator.health().await
    }

    async fn require_session(&self, session_id: &str) -> Result<Session, GameError> {
        self.sessions
            .get(session_id)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()).into())
    }

    async fn load_state(&self, session: &Session) -> Result<GameState, GameError> {
        let Some(step_id) = &session.current_step_id else {
            return Ok(self.scenario.initial_state());
        };
        let step = self
            .steps
            .get(step_id)
            .await?
            .ok_or_else(|| StoreError::StepNotFound(step_id.clone()))?;
        Ok(step.context)
    }

    /// Persist the step, then point the session at it. If the session vanished
    /// in between, the step is removed again.
    async fn commit(&self, session_id: &str, step: &Step) -> Result<(), GameError> {
        self.steps.put(step.clone()).await?;
        if let Err(err) = self.sessions.advance(session_id, &step.id).await {
            warn!(session = session_id, step = %step.id, %err, "rolling back orphaned step");
            if let Err(cleanup) = self.steps.delete(&step.id).await {
                warn!(step = %step.id, %cleanup, "failed to remove orphaned step");
            }
            return Err(err.into());
        }
        Ok(())
    }
}

fn assemble(scratch: ScratchRequest, context: GameState) -> Result<Step, GameError> {
    let user_input = scratch.user_input.ok_or(GameError::Incomplete("userInput"))?;
    let input_type = scratch.input_type.ok_or(GameError::Incomplete("inputType"))?;
    let event = scratch.event.ok_or(GameError::Incomplete("event"))?;
    let pre_log_summary = scratch
        .pre_log_summary
        .ok_or(GameError::Incomplete("preLogSummary"))?;
    Ok(Step::new(user_input, input_type, context, event, pre_log_summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::EchoGenerator;
    use crate::store::{MemorySessionStore, MemoryStepStore};

    #[test]
    fn pipeline_order_puts_validation_before_generation() {
        let orchestrator = Orchestrator::new(
            CoreConfig::default(),
            Arc::new(MemoryStepStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(EchoGenerator),
        );
        let ids: Vec<_> = orchestrator
            .build_pipeline()
            .stages()
            .iter()
            .map(|meta| meta.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "input-classifier",
                "time-advancer",
                "state-validator",
                "history-summarizer",
                "event-generator"
            ]
        );
    }

    #[test]
    fn assembly_requires_every_part() {
        let scratch = ScratchRequest::new("look", Vec::new());
        let err = assemble(scratch, GameState::new()).unwrap_err();
        assert_eq!(err, GameError::Incomplete("userInput"));
    }
}
