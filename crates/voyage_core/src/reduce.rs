use tracing::debug;

use crate::diff::ContextChanges;
use crate::state::GameState;

/// Counts of what a change set did to the state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    pub upserted: usize,
    pub removed: usize,
}

/// Commit `changes` to `state`. Deleting an absent field is not an error.
pub fn apply(state: &mut GameState, changes: &ContextChanges) -> Applied {
    let mut applied = Applied::default();
    for (key, change) in changes.iter() {
        match change {
            Some(field) => {
                state.upsert(key, field.clone());
                applied.upserted += 1;
                debug!(field = key, kind = %field.kind(), "updated field");
            }
            None => {
                if state.remove(key).is_some() {
                    applied.removed += 1;
                    debug!(field = key, "removed field");
                }
            }
        }
    }
    applied
}
