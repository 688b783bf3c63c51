use std::time::Duration;

use thiserror::Error;

/// Failures talking to the narrative generation service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("generation service timed out after {0:?}")]
    Timeout(Duration),
    #[error("generation service unreachable: {0}")]
    Transport(String),
    #[error("generation service returned {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("generation service response could not be decoded: {0}")]
    Decode(String),
    #[error("generation service rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("generation service response has no event description")]
    MissingDescription,
}

impl UpstreamError {
    /// Caller-facing description: status or code only, never upstream bodies.
    pub fn public_message(&self) -> String {
        match self {
            UpstreamError::Timeout(timeout) => {
                format!("narrative service timed out after {}ms", timeout.as_millis())
            }
            UpstreamError::Transport(_) => "narrative service is unreachable".to_string(),
            UpstreamError::Status { status, .. } => {
                format!("narrative service returned status {status}")
            }
            UpstreamError::Decode(_) => "narrative service sent an unreadable response".to_string(),
            UpstreamError::Rejected { code, .. } => {
                format!("narrative service rejected the request ({code})")
            }
            UpstreamError::MissingDescription => {
                "narrative service returned no event description".to_string()
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("step not found: {0}")]
    StepNotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fatal error raised by a stage. It aborts the whole chain unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error(
        "context field limit exceeded: {count} > {limit}. Remove some fields using mechanism questioning"
    )]
    FieldLimitExceeded { count: usize, limit: usize },
    #[error("{0} was not set by an earlier stage")]
    MissingScratch(&'static str),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stage {stage} failed: {message}")]
    Failed { stage: &'static str, message: String },
}

/// Externally visible error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    SessionNotFound,
    StepNotFound,
    ContextLimitExceeded,
    UpstreamFailure,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "INVALID_INPUT",
            ErrorCategory::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCategory::StepNotFound => "STEP_NOT_FOUND",
            ErrorCategory::ContextLimitExceeded => "CONTEXT_LIMIT_EXCEEDED",
            ErrorCategory::UpstreamFailure => "UPSTREAM_FAILURE",
            ErrorCategory::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(self) -> bool {
        matches!(
            self,
            ErrorCategory::SessionNotFound | ErrorCategory::StepNotFound
        )
    }
}

/// Error returned by the orchestrator for a whole request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("pipeline finished without producing {0}")]
    Incomplete(&'static str),
}

impl GameError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GameError::InvalidInput(_) => ErrorCategory::InvalidInput,
            GameError::Store(err) | GameError::Stage(StageError::Store(err)) => store_category(err),
            GameError::Stage(StageError::FieldLimitExceeded { .. }) => {
                ErrorCategory::ContextLimitExceeded
            }
            GameError::Stage(StageError::Upstream(_)) => ErrorCategory::UpstreamFailure,
            GameError::Stage(StageError::MissingScratch(_) | StageError::Failed { .. })
            | GameError::Incomplete(_) => ErrorCategory::Internal,
        }
    }

    /// Message safe to hand to end users.
    pub fn public_message(&self) -> String {
        match self {
            GameError::Stage(StageError::Upstream(err)) => err.public_message(),
            GameError::Store(StoreError::Unavailable(_))
            | GameError::Stage(StageError::Store(StoreError::Unavailable(_))) => {
                "storage is unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

fn store_category(err: &StoreError) -> ErrorCategory {
    match err {
        StoreError::SessionNotFound(_) => ErrorCategory::SessionNotFound,
        StoreError::StepNotFound(_) => ErrorCategory::StepNotFound,
        StoreError::Unavailable(_) => ErrorCategory::Internal,
    }
}
