use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::step::{now_millis, Session};
use crate::store::SessionStore;

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Reap against an explicit clock reading.
    pub async fn reap_expired_at(&self, now: i64, ttl: Duration) -> Vec<Session> {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<String> = sessions
            .values()
            .filter(|session| session.is_expired(now, ttl_millis))
            .map(|session| session.session_id.clone())
            .collect();
        let reaped = expired
            .iter()
            .filter_map(|id| sessions.remove(id))
            .collect();
        reaped
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self) -> Result<Session, StoreError> {
        let session = Session::new(now_millis());
        debug!(session = %session.session_id, "session created");
        self.sessions
            .lock()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.get_mut(id).map(|session| {
            session.touch(now_millis());
            session.clone()
        }))
    }

    async fn advance(&self, id: &str, step_id: &str) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        session.advance(step_id, now_millis());
        Ok(session.clone())
    }

    async fn history(&self, id: &str) -> Result<Vec<String>, StoreError> {
        self.sessions
            .lock()
            .await
            .get(id)
            .map(|session| session.step_history.clone())
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.lock().await.remove(id).is_some())
    }

    async fn reap_expired(&self, ttl: Duration) -> Result<Vec<Session>, StoreError> {
        let reaped = self.reap_expired_at(now_millis(), ttl).await;
        if !reaped.is_empty() {
            info!(reaped = reaped.len(), "expired sessions removed");
        }
        Ok(reaped)
    }
}
