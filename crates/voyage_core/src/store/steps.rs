use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::step::Step;
use crate::store::StepStore;

#[derive(Debug, Default)]
pub struct MemoryStepStore {
    steps: Mutex<HashMap<String, Step>>,
}

impl MemoryStepStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.steps.lock().await.len()
    }
}

#[async_trait]
impl StepStore for MemoryStepStore {
    async fn get(&self, id: &str) -> Result<Option<Step>, StoreError> {
        Ok(self.steps.lock().await.get(id).cloned())
    }

    async fn put(&self, step: Step) -> Result<(), StoreError> {
        debug!(step = %step.id, "step saved");
        self.steps.lock().await.insert(step.id.clone(), step);
        Ok(())
    }

    async fn list(&self, ids: &[String]) -> Result<Vec<Step>, StoreError> {
        let steps = self.steps.lock().await;
        Ok(ids.iter().filter_map(|id| steps.get(id).cloned()).collect())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.steps.lock().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Event;
    use crate::scratch::{InputType, PreLogSummary};
    use crate::state::GameState;

    fn step(input: &str) -> Step {
        Step::new(
            input,
            InputType::Action,
            GameState::new(),
            Event::narrative(format!("after {input}")),
            PreLogSummary {
                summary: String::new(),
                recent_events: Vec::new(),
                generated_at: 0,
            },
        )
    }

    #[tokio::test]
    async fn list_preserves_order_and_skips_unknown_ids() {
        let store = MemoryStepStore::new();
        let first = step("one");
        let second = step("two");
        store.put(first.clone()).await.expect("put");
        store.put(second.clone()).await.expect("put");

        let ids = vec![second.id.clone(), "missing".to_string(), first.id.clone()];
        let listed = store.list(&ids).await.expect("list");
        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test]
    async fn recent_keeps_the_tail() {
        let store = MemoryStepStore::new();
        let mut ids = Vec::new();
        for input in ["a", "b", "c", "d"] {
            let step = step(input);
            ids.push(step.id.clone());
            store.put(step).await.expect("put");
        }
        let recent = store.recent(&ids, 2).await.expect("recent");
        let inputs: Vec<_> = recent.iter().map(|step| step.user_input.as_str()).collect();
        assert_eq!(inputs, vec!["c", "d"]);
        assert!(store.recent(&ids, 0).await.expect("recent").is_empty());
        assert_eq!(store.recent(&ids, 10).await.expect("recent").len(), 4);
    }

    #[tokio::test]
    async fn get_and_delete() {
        let store = MemoryStepStore::new();
        let saved = step("x");
        store.put(saved.clone()).await.expect("put");
        assert_eq!(store.get(&saved.id).await.expect("get"), Some(saved.clone()));
        assert!(store.delete(&saved.id).await.expect("delete"));
        assert!(!store.delete(&saved.id).await.expect("delete"));
        assert_eq!(store.get(&saved.id).await.expect("get"), None);
    }
}
