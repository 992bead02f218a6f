//! Task operations and the kanban board.

use super::{
    Board, double_option, edited_text, optional_text, parse_due_date, parse_priority,
    required_text,
};
use crate::db::tasks::{NewTask, TaskChanges, TaskFilter};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::hierarchy::{PlacementRequest, check_placement, resolve_hierarchy};
use crate::policy::{Action, Actor, Relationship};
use crate::types::{BoardColumn, Priority, Task, TaskStatus, TaskView};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub is_general: bool,
    pub section: Option<String>,
    pub topic: Option<String>,
    pub domain: Option<String>,
    pub leader_id: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub collaborator_ids: Vec<String>,
}

/// Task edit. Nullable columns use `null` to clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    pub priority: Option<String>,
    pub leader_id: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub section: Option<Option<String>>,
    pub topic: Option<String>,
}

impl UpdateTaskInput {
    /// Any field other than status.
    fn has_detail_fields(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.domain.is_some()
            || self.due_date.is_some()
            || self.priority.is_some()
            || self.leader_id.is_some()
            || self.section.is_some()
            || self.topic.is_some()
    }
}

/// Query-string filters for task lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub section: Option<String>,
    pub topic: Option<String>,
    pub domain: Option<String>,
    pub parent_task_id: Option<String>,
    pub is_general: Option<bool>,
    pub pinned: Option<bool>,
    pub q: Option<String>,
}

fn parse_status(value: &str) -> ApiResult<TaskStatus> {
    TaskStatus::from_str(value.trim()).ok_or_else(|| {
        ApiError::invalid_value(
            "status",
            "status must be one of: pending, in-progress, completed",
        )
    })
}

impl TaskQuery {
    pub fn into_filter(self) -> ApiResult<TaskFilter> {
        let status = optional_text(self.status.as_deref());
        let priority = optional_text(self.priority.as_deref());
        Ok(TaskFilter {
            status: status.as_deref().map(parse_status).transpose()?,
            priority: priority.as_deref().map(parse_priority).transpose()?,
            section: optional_text(self.section.as_deref()),
            topic: optional_text(self.topic.as_deref()),
            domain: optional_text(self.domain.as_deref()),
            parent_task_id: optional_text(self.parent_task_id.as_deref()),
            is_general: self.is_general,
            pinned: self.pinned,
            search: optional_text(self.q.as_deref()),
            mine: false,
        })
    }
}

/// Drop repeats, keeping first occurrence order.
fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Group tasks into columns by domain (ascending). Within a column, tasks
/// run pending, in progress, completed, newest first inside each status.
pub fn group_into_columns(tasks: Vec<TaskView>) -> Vec<BoardColumn> {
    let mut columns: BTreeMap<String, Vec<TaskView>> = BTreeMap::new();
    for view in tasks {
        columns.entry(view.task.domain.clone()).or_default().push(view);
    }
    columns
        .into_iter()
        .map(|(domain, mut tasks)| {
            tasks.sort_by_key(|v| {
                (
                    v.task.status.board_order(),
                    Reverse(v.task.created_at),
                    Reverse(v.task.id.clone()),
                )
            });
            BoardColumn { domain, tasks }
        })
        .collect()
}

impl Board {
    fn task_view(&self, actor: &Actor, task: Task) -> ApiResult<TaskView> {
        self.db
            .task_views(&actor.user_id, vec![task])?
            .pop()
            .ok_or_else(|| ApiError::internal("task view missing"))
    }

    pub(crate) fn require_visible_task(&self, actor: &Actor, task_id: &str) -> ApiResult<Task> {
        self.db
            .visible_task(actor, task_id)?
            .ok_or_else(|| ApiError::not_found("task"))
    }

    pub fn list_tasks(&self, actor: &Actor, query: TaskQuery) -> ApiResult<Vec<TaskView>> {
        let filter = query.into_filter()?;
        let tasks = self.db.list_tasks(actor, &filter)?;
        Ok(self.db.task_views(&actor.user_id, tasks)?)
    }

    /// Visible tasks the actor leads or collaborates on.
    pub fn my_tasks(&self, actor: &Actor, query: TaskQuery) -> ApiResult<Vec<TaskView>> {
        let mut filter = query.into_filter()?;
        filter.mine = true;
        let tasks = self.db.list_tasks(actor, &filter)?;
        Ok(self.db.task_views(&actor.user_id, tasks)?)
    }

    /// Visible tasks grouped into kanban columns.
    pub fn board(&self, actor: &Actor, query: TaskQuery) -> ApiResult<Vec<BoardColumn>> {
        Ok(group_into_columns(self.list_tasks(actor, query)?))
    }

    pub fn get_task(&self, actor: &Actor, task_id: &str) -> ApiResult<TaskView> {
        let task = self.require_visible_task(actor, task_id)?;
        self.task_view(actor, task)
    }

    pub fn create_task(&self, actor: &Actor, input: CreateTaskInput) -> ApiResult<TaskView> {
        self.policy.check(actor, Action::CreateTask)?;

        let parent_task_id = optional_text(input.parent_task_id.as_deref());
        let parent = match &parent_task_id {
            Some(id) if !input.is_general => self.db.visible_parent_task(actor, id)?,
            _ => None,
        };
        let placement = resolve_hierarchy(
            &PlacementRequest {
                parent_task_id: parent_task_id.as_deref(),
                is_general: input.is_general,
                section: input.section.as_deref(),
                topic: input.topic.as_deref(),
                domain: input.domain.as_deref(),
            },
            parent.as_ref(),
            &self.catalog,
        )?;

        let title = required_text("title", input.title.as_deref())?;
        let leader_id = required_text("leader_id", input.leader_id.as_deref())?;
        let priority = match input.priority.as_deref() {
            Some(p) => parse_priority(p)?,
            None => Priority::default(),
        };
        let due_date = optional_text(input.due_date.as_deref())
            .as_deref()
            .map(parse_due_date)
            .transpose()?;

        if !self.db.missing_users(std::slice::from_ref(&leader_id))?.is_empty() {
            return Err(ApiError::invalid_value("leader_id", "leader is not a known user"));
        }
        let collaborator_ids = dedup_ids(input.collaborator_ids);
        let missing = self.db.missing_users(&collaborator_ids)?;
        if !missing.is_empty() {
            return Err(ApiError::invalid_value(
                "collaborator_ids",
                format!("unknown users: {}", missing.join(", ")),
            ));
        }

        let task = self.db.create_task(NewTask {
            title,
            description: optional_text(input.description.as_deref()),
            parent_task_id,
            is_general: input.is_general,
            placement,
            leader_id,
            due_date,
            priority,
            collaborator_ids,
        })?;
        info!(task_id = %task.id, user_id = %actor.user_id, "Created task");

        self.task_view(actor, task)
    }

    /// Edit a task. A body carrying only `status` follows the status rule
    /// (leader, collaborators, team leads, managers); anything else needs a
    /// team lead or manager.
    pub fn update_task(&self, actor: &Actor, task_id: &str, input: UpdateTaskInput) -> ApiResult<TaskView> {
        let details = input.has_detail_fields();
        if details {
            self.policy.check(actor, Action::EditTaskDetails)?;
        }

        let current = self.require_visible_task(actor, task_id)?;

        if !details && input.status.is_none() {
            return Err(ApiError::new(
                ErrorCode::InvalidFieldValue,
                "no fields to update",
            ));
        }
        if !details {
            let relationship = Relationship {
                is_leader: current.leader_id == actor.user_id,
                is_collaborator: self.db.is_collaborator(task_id, &actor.user_id)?,
            };
            self.policy
                .check(actor, Action::ChangeTaskStatus(relationship))?;
        }

        let mut changes = TaskChanges {
            title: edited_text("title", input.title.as_deref())?,
            description: input
                .description
                .map(|d| optional_text(d.as_deref())),
            domain: edited_text("domain", input.domain.as_deref())?,
            due_date: match input.due_date {
                None => None,
                Some(d) => Some(
                    optional_text(d.as_deref())
                        .as_deref()
                        .map(parse_due_date)
                        .transpose()?,
                ),
            },
            priority: input.priority.as_deref().map(parse_priority).transpose()?,
            leader_id: edited_text("leader_id", input.leader_id.as_deref())?,
            status: input.status.as_deref().map(parse_status).transpose()?,
            ..Default::default()
        };

        if let Some(leader_id) = &changes.leader_id {
            if !self.db.missing_users(std::slice::from_ref(leader_id))?.is_empty() {
                return Err(ApiError::invalid_value("leader_id", "leader is not a known user"));
            }
        }

        if input.section.is_some() || input.topic.is_some() {
            if current.parent_task_id.is_some() {
                let field = if input.section.is_some() { "section" } else { "topic" };
                return Err(ApiError::invalid_value(
                    field,
                    "section and topic are inherited from the parent task",
                ));
            }
            let section = match &input.section {
                Some(s) => optional_text(s.as_deref()),
                None => current.section.clone(),
            };
            let topic = match &input.topic {
                Some(t) => required_text("topic", Some(t.as_str()))?,
                None => current.topic.clone(),
            };
            check_placement(section.as_deref(), &topic, &self.catalog)?;
            changes.section = Some(section);
            changes.topic = Some(topic);
        }

        let task = self
            .db
            .update_task(task_id, &changes)?
            .ok_or_else(|| ApiError::not_found("task"))?;
        info!(task_id = %task.id, user_id = %actor.user_id, status = task.status.as_str(), "Updated task");

        self.task_view(actor, task)
    }

    pub fn delete_task(&self, actor: &Actor, task_id: &str) -> ApiResult<()> {
        self.policy.check(actor, Action::DeleteTask)?;
        self.require_visible_task(actor, task_id)?;

        if !self.db.delete_task(task_id)? {
            return Err(ApiError::not_found("task"));
        }
        info!(task_id, user_id = %actor.user_id, "Deleted task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let ids = dedup_ids(vec!["b".into(), "a".into(), " b ".into(), "".into()]);
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn status_only_body_has_no_detail_fields() {
        let body: UpdateTaskInput = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert!(!body.has_detail_fields());
        let body: UpdateTaskInput = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert!(body.has_detail_fields());
    }

    #[test]
    fn query_rejects_unknown_enum_values() {
        let query = TaskQuery {
            status: Some("done".into()),
            ..Default::default()
        };
        assert_eq!(
            query.into_filter().unwrap_err().code,
            ErrorCode::InvalidFieldValue
        );
        let query = TaskQuery {
            status: Some("".into()),
            q: Some("  ".into()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert!(filter.status.is_none());
        assert!(filter.search.is_none());
    }
}
