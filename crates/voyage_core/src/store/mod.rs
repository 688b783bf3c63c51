//! Step history and session persistence seams, with in-memory backends.

pub mod sessions;
pub mod steps;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::step::{Session, Step};

pub use sessions::MemorySessionStore;
pub use steps::MemoryStepStore;

#[async_trait]
pub trait StepStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Step>, StoreError>;

    async fn put(&self, step: Step) -> Result<(), StoreError>;

    /// Steps for `ids` in the given order; unknown ids are skipped.
    async fn list(&self, ids: &[String]) -> Result<Vec<Step>, StoreError>;

    /// The last `limit` steps that [`StepStore::list`] would return.
    async fn recent(&self, ids: &[String], limit: usize) -> Result<Vec<Step>, StoreError> {
        let mut steps = self.list(ids).await?;
        let skip = steps.len().saturating_sub(limit);
        Ok(steps.split_off(skip))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self) -> Result<Session, StoreError>;

    /// Fetch a session and mark it as accessed.
    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Append `step_id` to the history and make it current.
    async fn advance(&self, id: &str, step_id: &str) -> Result<Session, StoreError>;

    async fn history(&self, id: &str) -> Result<Vec<String>, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Drop sessions idle for longer than `ttl` and return them.
    async fn reap_expired(&self, ttl: Duration) -> Result<Vec<Session>, StoreError>;
}
