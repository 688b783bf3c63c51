use std::fmt;

use tracing::{debug, info, warn};

use crate::scratch::ScratchRequest;
use crate::stage::{Flow, Next, Stage, StageMetadata, StageResult};
use crate::state::GameState;

/// Ordered middleware chain of stages for a single request.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Stages run in registration order.
    pub fn register<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.register_boxed(Box::new(stage))
    }

    pub fn register_boxed(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        debug!(stage = stage.metadata().id, position = self.stages.len(), "registered stage");
        self.stages.push(stage);
        self
    }

    /// Metadata of the registered stages, in order.
    pub fn stages(&self) -> Vec<StageMetadata> {
        self.stages.iter().map(|stage| stage.metadata()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn clear(&mut self) {
        self.stages.clear();
    }

    /// Run the chain once. The first stage error is returned as raised; later
    /// stages do not run and nothing after the failing stage resumes.
    pub async fn execute(&self, scratch: &mut ScratchRequest, state: &mut GameState) -> StageResult {
        info!(stages = self.stages.len(), "executing pipeline");
        let outcome = Next::start(&self.stages).run(scratch, state).await;
        match &outcome {
            Ok(Flow::Exhausted) => debug!("pipeline completed"),
            Ok(Flow::Halted { stage }) => info!(stage, "pipeline short-circuited"),
            Err(err) => warn!(%err, "pipeline aborted"),
        }
        outcome
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.metadata().id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::error::StageError;

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records entry and exit around the rest of the chain.
    struct Probe {
        id: &'static str,
        journal: Journal,
        behaviour: Behaviour,
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        Continue,
        Halt,
        Fail,
    }

    impl Probe {
        fn new(id: &'static str, journal: &Journal, behaviour: Behaviour) -> Self {
            Self {
                id,
                journal: Arc::clone(journal),
                behaviour,
            }
        }

        fn log(&self, what: &str) {
            self.journal
                .lock()
                .expect("journal lock")
                .push(format!("{}:{}", what, self.id));
        }
    }

    #[async_trait]
    impl Stage for Probe {
        fn metadata(&self) -> StageMetadata {
            StageMetadata {
                id: self.id,
                name: "Probe",
                version: "1.0.0",
            }
        }

        async fn process(
            &self,
            scratch: &mut ScratchRequest,
            state: &mut GameState,
            next: Next<'_>,
        ) -> StageResult {
            self.log("enter");
            let outcome = match self.behaviour {
                Behaviour::Continue => next.run(scratch, state).await,
                Behaviour::Halt => Ok(Flow::Halted { stage: self.id }),
                Behaviour::Fail => Err(StageError::Failed {
                    stage: self.id,
                    message: "boom".to_string(),
                }),
            };
            self.log("exit");
            outcome
        }
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().expect("journal lock").clone()
    }

    #[tokio::test]
    async fn stages_nest_in_registration_order() {
        let log = journal();
        let mut pipeline = Pipeline::new();
        pipeline
            .register(Probe::new("a", &log, Behaviour::Continue))
            .register(Probe::new("b", &log, Behaviour::Continue))
            .register(Probe::new("c", &log, Behaviour::Continue));

        let mut scratch = ScratchRequest::new("look", Vec::new());
        let mut state = GameState::new();
        let flow = pipeline.execute(&mut scratch, &mut state).await.expect("chain runs");

        assert_eq!(flow, Flow::Exhausted);
        assert_eq!(
            entries(&log),
            vec!["enter:a", "enter:b", "enter:c", "exit:c", "exit:b", "exit:a"]
        );
    }

    #[tokio::test]
    async fn empty_pipeline_reaches_terminal_case() {
        let pipeline = Pipeline::new();
        let mut scratch = ScratchRequest::new("look", Vec::new());
        let mut state = GameState::new();
        let flow = pipeline.execute(&mut scratch, &mut state).await.expect("chain runs");
        assert_eq!(flow, Flow::Exhausted);
    }

    #[tokio::test]
    async fn failure_in_third_stage_skips_the_rest_and_surfaces_unchanged() {
        let log = journal();
        let mut pipeline = Pipeline::new();
        pipeline
            .register(Probe::new("one", &log, Behaviour::Continue))
            .register(Probe::new("two", &log, Behaviour::Continue))
            .register(Probe::new("three", &log, Behaviour::Fail))
            .register(Probe::new("four", &log, Behaviour::Continue))
            .register(Probe::new("five", &log, Behaviour::Continue));

        let mut scratch = ScratchRequest::new("look", Vec::new());
        let mut state = GameState::new();
        let err = pipeline.execute(&mut scratch, &mut state).await.unwrap_err();

        assert_eq!(
            err,
            StageError::Failed {
                stage: "three",
                message: "boom".to_string()
            }
        );
        let seen = entries(&log);
        assert!(!seen.iter().any(|entry| entry.ends_with(":four") || entry.ends_with(":five")));
    }

    #[tokio::test]
    async fn omitting_next_halts_without_error() {
        let log = journal();
        let mut pipeline = Pipeline::new();
        pipeline
            .register(Probe::new("gate", &log, Behaviour::Halt))
            .register(Probe::new("after", &log, Behaviour::Continue));

        let mut scratch = ScratchRequest::new("look", Vec::new());
        let mut state = GameState::new();
        let flow = pipeline.execute(&mut scratch, &mut state).await.expect("chain runs");

        assert_eq!(flow, Flow::Halted { stage: "gate" });
        assert_eq!(entries(&log), vec!["enter:gate", "exit:gate"]);
    }

    #[test]
    fn introspection_lists_and_clears() {
        let log = journal();
        let mut pipeline = Pipeline::new();
        pipeline
            .register(Probe::new("a", &log, Behaviour::Continue))
            .register(Probe::new("b", &log, Behaviour::Continue));
        let ids: Vec<_> = pipeline.stages().iter().map(|meta| meta.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(format!("{:?}", pipeline), r#"["a", "b"]"#);

        pipeline.clear();
        assert!(pipeline.is_empty());
    }
}
