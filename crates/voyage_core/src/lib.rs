//! Game core for a text adventure driven by a generative narrator.
//!
//! Each player input runs through a [`Pipeline`] of [`Stage`]s that classify
//! the input, advance the clock, guard the state size, summarize history and
//! ask the narrator for the next event. The [`Orchestrator`] wraps one such
//! run with loading and persistence.

pub mod config;
pub mod diff;
pub mod error;
pub mod generation;
pub mod orchestrator;
pub mod pipeline;
pub mod reduce;
pub mod scenario;
pub mod scratch;
pub mod stage;
pub mod stages;
pub mod state;
pub mod step;
pub mod store;

pub use config::CoreConfig;
pub use diff::{ContextChanges, Event};
pub use error::{ErrorCategory, GameError, StageError, StoreError, UpstreamError};
pub use generation::{EchoGenerator, GenerationService};
pub use orchestrator::{Orchestrator, StepOutcome};
pub use pipeline::Pipeline;
pub use scenario::Scenario;
pub use scratch::{InputType, PreLogSummary, ScratchRequest};
pub use stage::{Flow, Next, Stage, StageMetadata, StageResult};
pub use state::{ContextField, FieldKind, FieldValue, GameState};
pub use step::{Session, Step};
pub use store::{MemorySessionStore, MemoryStepStore, SessionStore, StepStore};
