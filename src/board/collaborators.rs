use super::{Board, required_text};
use crate::error::{ApiError, ApiResult};
use crate::policy::{Action, Actor};
use crate::types::Collaborator;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddCollaboratorInput {
    pub user_id: Option<String>,
}

impl Board {
    pub fn list_collaborators(&self, actor: &Actor, task_id: &str) -> ApiResult<Vec<Collaborator>> {
        self.require_visible_task(actor, task_id)?;
        Ok(self.db.collaborators(task_id)?)
    }

    /// Add a collaborator; adding an existing one is a no-op. Returns the
    /// task's collaborators.
    pub fn add_collaborator(
        &self,
        actor: &Actor,
        task_id: &str,
        input: AddCollaboratorInput,
    ) -> ApiResult<Vec<Collaborator>> {
        self.policy.check(actor, Action::ManageCollaborators)?;
        self.require_visible_task(actor, task_id)?;

        let user_id = required_text("user_id", input.user_id.as_deref())?;
        if self.db.get_user(&user_id)?.is_none() {
            return Err(ApiError::invalid_value("user_id", "user is not a known user"));
        }

        if self.db.add_collaborator(task_id, &user_id)? {
            info!(task_id, collaborator = %user_id, by = %actor.user_id, "Added collaborator");
        }
        Ok(self.db.collaborators(task_id)?)
    }

    /// Remove a collaborator; removing a non-collaborator is a no-op.
    pub fn remove_collaborator(&self, actor: &Actor, task_id: &str, user_id: &str) -> ApiResult<Vec<Collaborator>> {
        self.policy.check(actor, Action::ManageCollaborators)?;
        self.require_visible_task(actor, task_id)?;

        if self.db.remove_collaborator(task_id, user_id)? {
            info!(task_id, collaborator = user_id, by = %actor.user_id, "Removed collaborator");
        }
        Ok(self.db.collaborators(task_id)?)
    }
}
