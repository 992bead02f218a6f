//! Parent task operations.

use super::{Board, edited_text, parse_priority, required_text};
use crate::db::parent_tasks::{NewParentTask, ParentTaskChanges};
use crate::db::tasks::TaskFilter;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::policy::{Action, Actor};
use crate::types::{ParentTask, ParentTaskDetail, ParentTaskView, Priority};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateParentTaskInput {
    pub section: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateParentTaskInput {
    pub section: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub priority: Option<String>,
}

impl UpdateParentTaskInput {
    fn is_empty(&self) -> bool {
        self.section.is_none()
            && self.domain.is_none()
            && self.title.is_none()
            && self.topic.is_none()
            && self.priority.is_none()
    }
}

impl Board {
    fn parent_view(&self, actor: &Actor, parent: ParentTask) -> ApiResult<ParentTaskView> {
        self.db
            .parent_task_views(actor, vec![parent])?
            .pop()
            .ok_or_else(|| ApiError::internal("parent task view missing"))
    }

    fn require_visible_parent(&self, actor: &Actor, parent_id: &str) -> ApiResult<ParentTask> {
        self.db
            .visible_parent_task(actor, parent_id)?
            .ok_or_else(|| ApiError::not_found("parent task"))
    }

    pub fn list_parent_tasks(&self, actor: &Actor) -> ApiResult<Vec<ParentTaskView>> {
        let parents = self.db.visible_parent_tasks(actor)?;
        Ok(self.db.parent_task_views(actor, parents)?)
    }

    pub fn create_parent_task(&self, actor: &Actor, input: CreateParentTaskInput) -> ApiResult<ParentTaskView> {
        self.policy.check(actor, Action::CreateParentTask)?;

        let title = required_text("title", input.title.as_deref())?;
        let section = required_text("section", input.section.as_deref())?;
        let topic = required_text("topic", input.topic.as_deref())?;
        let domain = required_text("domain", input.domain.as_deref())?;
        self.catalog.check_topic(&section, &topic)?;
        let priority = match input.priority.as_deref() {
            Some(p) => parse_priority(p)?,
            None => Priority::default(),
        };

        let parent = self.db.create_parent_task(NewParentTask {
            section,
            domain,
            title,
            topic,
            priority,
            created_by_user_id: actor.user_id.clone(),
        })?;
        info!(parent_task_id = %parent.id, user_id = %actor.user_id, "Created parent task");

        self.parent_view(actor, parent)
    }

    /// Parent task with the children the viewer can see.
    pub fn get_parent_task(&self, actor: &Actor, parent_id: &str) -> ApiResult<ParentTaskDetail> {
        let parent = self.require_visible_parent(actor, parent_id)?;
        let view = self.parent_view(actor, parent)?;

        let filter = TaskFilter {
            parent_task_id: Some(parent_id.to_string()),
            ..Default::default()
        };
        let children = self.db.list_tasks(actor, &filter)?;
        let children = self.db.task_views(&actor.user_id, children)?;

        Ok(ParentTaskDetail {
            parent_task: view,
            children,
        })
    }

    pub fn update_parent_task(
        &self,
        actor: &Actor,
        parent_id: &str,
        input: UpdateParentTaskInput,
    ) -> ApiResult<ParentTaskView> {
        self.policy.check(actor, Action::EditParentTask)?;
        let current = self.require_visible_parent(actor, parent_id)?;

        if input.is_empty() {
            return Err(ApiError::new(
                ErrorCode::InvalidFieldValue,
                "no fields to update",
            ));
        }

        let changes = ParentTaskChanges {
            section: edited_text("section", input.section.as_deref())?,
            domain: edited_text("domain", input.domain.as_deref())?,
            title: edited_text("title", input.title.as_deref())?,
            topic: edited_text("topic", input.topic.as_deref())?,
            priority: input.priority.as_deref().map(parse_priority).transpose()?,
        };

        // The final pair must still be consistent
        let section = changes.section.as_deref().unwrap_or(&current.section);
        let topic = changes.topic.as_deref().unwrap_or(&current.topic);
        self.catalog.check_topic(section, topic)?;

        let parent = self
            .db
            .update_parent_task(parent_id, &changes)?
            .ok_or_else(|| ApiError::not_found("parent task"))?;
        info!(parent_task_id = %parent.id, user_id = %actor.user_id, "Updated parent task");

        self.parent_view(actor, parent)
    }

    /// Delete a parent task. Managers only; children survive unparented.
    pub fn delete_parent_task(&self, actor: &Actor, parent_id: &str) -> ApiResult<()> {
        self.policy.check(actor, Action::DeleteParentTask)?;
        self.require_visible_parent(actor, parent_id)?;

        if !self.db.delete_parent_task(parent_id)? {
            return Err(ApiError::not_found("parent task"));
        }
        info!(parent_task_id = parent_id, user_id = %actor.user_id, "Deleted parent task");
        Ok(())
    }
}
