use super::{Board, required_text};
use crate::error::ApiResult;
use crate::policy::{Action, Actor};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinInput {
    pub task_id: Option<String>,
}

impl Board {
    /// Ids of the actor's pinned tasks.
    pub fn pinned_tasks(&self, actor: &Actor) -> ApiResult<Vec<String>> {
        Ok(self.db.pinned_task_ids(&actor.user_id)?)
    }

    /// Pin a visible task for the actor. Pinning twice is a no-op.
    pub fn pin_task(&self, actor: &Actor, input: PinInput) -> ApiResult<Vec<String>> {
        self.policy.check(actor, Action::PinTask)?;
        let task_id = required_text("task_id", input.task_id.as_deref())?;
        self.require_visible_task(actor, &task_id)?;

        if self.db.pin_task(&actor.user_id, &task_id)? {
            debug!(task_id = %task_id, user_id = %actor.user_id, "Pinned task");
        }
        self.pinned_tasks(actor)
    }

    pub fn unpin_task(&self, actor: &Actor, task_id: &str) -> ApiResult<Vec<String>> {
        self.policy.check(actor, Action::PinTask)?;
        if self.db.unpin_task(&actor.user_id, task_id)? {
            debug!(task_id, user_id = %actor.user_id, "Unpinned task");
        }
        self.pinned_tasks(actor)
    }
}
