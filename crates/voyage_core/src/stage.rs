//! The unit of pipeline work and the continuation that runs the rest of the
//! chain.
//!
//! A [`Stage`] receives the request scratch, the game state and a [`Next`]
//! handle. Calling [`Next::run`] executes every later stage before returning,
//! so work placed after the call observes what downstream stages did.
//! Returning without calling it ends the chain quietly; returning an error
//! aborts it.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::StageError;
use crate::scratch::ScratchRequest;
use crate::state::GameState;

/// Identity of a stage, used for diagnostics only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// How a chain ended when no stage failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Every registered stage ran and the terminal continuation was reached.
    Exhausted,
    /// A stage returned without continuing.
    Halted { stage: &'static str },
}

pub type StageResult = Result<Flow, StageError>;

#[async_trait]
pub trait Stage: Send + Sync {
    fn metadata(&self) -> StageMetadata;

    /// Do this stage's work. Neither `scratch` nor `state` may be retained
    /// past the returned future.
    async fn process(
        &self,
        scratch: &mut ScratchRequest,
        state: &mut GameState,
        next: Next<'_>,
    ) -> StageResult;
}

/// Continuation over the stages after the current cursor.
///
/// `run` consumes the handle, so a stage can continue the chain at most once.
pub struct Next<'a> {
    stages: &'a [Box<dyn Stage>],
    cursor: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn start(stages: &'a [Box<dyn Stage>]) -> Self {
        Self { stages, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.stages.len().saturating_sub(self.cursor)
    }

    pub async fn run(self, scratch: &mut ScratchRequest, state: &mut GameState) -> StageResult {
        let Some(stage) = self.stages.get(self.cursor) else {
            trace!(cursor = self.cursor, "end of chain");
            return Ok(Flow::Exhausted);
        };
        let metadata = stage.metadata();
        debug!(stage = metadata.id, cursor = self.cursor, "entering stage");
        let next = Next {
            stages: self.stages,
            cursor: self.cursor + 1,
        };
        stage.process(scratch, state, next).await
    }
}
