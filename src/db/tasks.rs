//! Task storage, filtered listing and view enrichment.

use super::collaborators::collaborators_for;
use super::discussion::{delete_thread, indicators_for};
use super::pins::pinned_among;
use super::visibility::task_visibility_clause;
use super::{Database, bind, bind_list, now_ms, parse_text, placeholders};
use crate::hierarchy::Placement;
use crate::policy::Actor;
use crate::types::{
    EntityType, ParentTask, ParentTaskView, Priority, Task, TaskStatus, TaskView,
};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashMap;
use uuid::Uuid;

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.parent_task_id, t.is_general, \
     t.section, t.domain, t.topic, t.leader_id, t.due_date, t.priority, t.status, \
     t.created_at, t.updated_at";

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get(10)?;
    let status: String = row.get(11)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        parent_task_id: row.get(3)?,
        is_general: row.get(4)?,
        section: row.get(5)?,
        domain: row.get(6)?,
        topic: row.get(7)?,
        leader_id: row.get(8)?,
        due_date: row.get(9)?,
        priority: parse_text(10, &priority, Priority::from_str)?,
        status: parse_text(11, &status, TaskStatus::from_str)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

/// Validated fields for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub parent_task_id: Option<String>,
    pub is_general: bool,
    pub placement: Placement,
    pub leader_id: String,
    pub due_date: Option<i64>,
    pub priority: Priority,
    pub collaborator_ids: Vec<String>,
}

/// Validated task edit. `None` leaves a field unchanged; for nullable
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub domain: Option<String>,
    pub due_date: Option<Option<i64>>,
    pub priority: Option<Priority>,
    pub leader_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub section: Option<Option<String>>,
    pub topic: Option<String>,
}

/// List filters, AND-combined.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub section: Option<String>,
    pub topic: Option<String>,
    pub domain: Option<String>,
    pub parent_task_id: Option<String>,
    pub is_general: Option<bool>,
    /// Only tasks the viewer has (or has not) pinned.
    pub pinned: Option<bool>,
    /// Case-insensitive substring of title, description, domain or topic.
    pub search: Option<String>,
    /// Only tasks the viewer leads or collaborates on.
    pub mine: bool,
}

/// LIKE pattern for `search`, folded the same way as `fold_case`.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl Database {
    /// Insert a task and its initial collaborators in one transaction.
    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        let now = now_ms();
        let task = Task {
            id: Uuid::now_v7().to_string(),
            title: new.title,
            description: new.description,
            parent_task_id: new.parent_task_id,
            is_general: new.is_general,
            section: new.placement.section,
            domain: new.placement.domain,
            topic: new.placement.topic,
            leader_id: new.leader_id,
            due_date: new.due_date,
            priority: new.priority,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO tasks (id, title, description, parent_task_id, is_general, section,
                                    domain, topic, leader_id, due_date, priority, status,
                                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    &task.id,
                    &task.title,
                    &task.description,
                    &task.parent_task_id,
                    task.is_general,
                    &task.section,
                    &task.domain,
                    &task.topic,
                    &task.leader_id,
                    task.due_date,
                    task.priority.as_str(),
                    task.status.as_str(),
                    task.created_at,
                    task.updated_at,
                ],
            )?;
            for user_id in &new.collaborator_ids {
                tx.execute(
                    "INSERT INTO task_collaborators (task_id, user_id, role)
                     VALUES (?1, ?2, 'collaborator')
                     ON CONFLICT DO NOTHING",
                    params![&task.id, user_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })?;

        Ok(task)
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    pub fn update_task(&self, task_id: &str, changes: &TaskChanges) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let Some(mut task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };

            if let Some(title) = &changes.title {
                task.title = title.clone();
            }
            if let Some(description) = &changes.description {
                task.description = description.clone();
            }
            if let Some(domain) = &changes.domain {
                task.domain = domain.clone();
            }
            if let Some(due_date) = changes.due_date {
                task.due_date = due_date;
            }
            if let Some(priority) = changes.priority {
                task.priority = priority;
            }
            if let Some(leader_id) = &changes.leader_id {
                task.leader_id = leader_id.clone();
            }
            if let Some(status) = changes.status {
                task.status = status;
            }
            if let Some(section) = &changes.section {
                task.section = section.clone();
            }
            if let Some(topic) = &changes.topic {
                task.topic = topic.clone();
            }
            task.updated_at = now_ms();

            conn.execute(
                "UPDATE tasks
                 SET title = ?1, description = ?2, domain = ?3, due_date = ?4, priority = ?5,
                     leader_id = ?6, status = ?7, section = ?8, topic = ?9, updated_at = ?10
                 WHERE id = ?11",
                params![
                    &task.title,
                    &task.description,
                    &task.domain,
                    task.due_date,
                    task.priority.as_str(),
                    &task.leader_id,
                    task.status.as_str(),
                    &task.section,
                    &task.topic,
                    task.updated_at,
                    task_id,
                ],
            )?;

            Ok(Some(task))
        })
    }

    /// Delete a task with its discussion; collaborators and pins cascade.
    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            delete_thread(&tx, EntityType::Task, task_id)?;
            let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            tx.commit()?;
            Ok(deleted > 0)
        })
    }

    /// Every task `actor` may see, newest first.
    pub fn visible_tasks(&self, actor: &Actor) -> Result<Vec<Task>> {
        self.list_tasks(actor, &TaskFilter::default())
    }

    /// Tasks `actor` may see that match `filter`, newest first.
    pub fn list_tasks(&self, actor: &Actor, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut params: Vec<Value> = Vec::new();
        let mut conditions = vec![task_visibility_clause("t", actor, &mut params)];

        if let Some(status) = filter.status {
            conditions.push(format!("t.status = {}", bind(&mut params, status.as_str().to_string())));
        }
        if let Some(priority) = filter.priority {
            conditions.push(format!(
                "t.priority = {}",
                bind(&mut params, priority.as_str().to_string())
            ));
        }
        if let Some(section) = &filter.section {
            conditions.push(format!("t.section = {}", bind(&mut params, section.clone())));
        }
        if let Some(topic) = &filter.topic {
            conditions.push(format!("t.topic = {}", bind(&mut params, topic.clone())));
        }
        if let Some(domain) = &filter.domain {
            conditions.push(format!("t.domain = {}", bind(&mut params, domain.clone())));
        }
        if let Some(parent_id) = &filter.parent_task_id {
            conditions.push(format!(
                "t.parent_task_id = {}",
                bind(&mut params, parent_id.clone())
            ));
        }
        if let Some(is_general) = filter.is_general {
            conditions.push(format!("t.is_general = {}", bind(&mut params, is_general)));
        }
        if let Some(pinned) = filter.pinned {
            let user = bind(&mut params, actor.user_id.clone());
            conditions.push(format!(
                "{}EXISTS (SELECT 1 FROM pinned_tasks fp WHERE fp.task_id = t.id AND fp.user_id = {})",
                if pinned { "" } else { "NOT " },
                user
            ));
        }
        if filter.mine {
            let user = bind(&mut params, actor.user_id.clone());
            conditions.push(format!(
                "(t.leader_id = {u} OR EXISTS (
                     SELECT 1 FROM task_collaborators fc WHERE fc.task_id = t.id AND fc.user_id = {u}))",
                u = user
            ));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = bind(&mut params, like_pattern(search));
            conditions.push(format!(
                "(fold_case(t.title) LIKE {p} ESCAPE '\\'
                  OR fold_case(COALESCE(t.description, '')) LIKE {p} ESCAPE '\\'
                  OR fold_case(t.domain) LIKE {p} ESCAPE '\\'
                  OR fold_case(t.topic) LIKE {p} ESCAPE '\\')",
                p = pattern
            ));
        }

        let sql = format!(
            "SELECT {} FROM tasks t WHERE {} ORDER BY t.created_at DESC, t.id DESC",
            TASK_COLUMNS,
            conditions.join(" AND ")
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(params.iter()), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Attach leader, parent title, collaborators, discussion indicator and
    /// pin flag to each task, as seen by `viewer_id`. Order is preserved.
    pub fn task_views(&self, viewer_id: &str, tasks: Vec<Task>) -> Result<Vec<TaskView>> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let task_ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();

        self.with_conn(|conn| {
            let mut leader_ids: Vec<String> = tasks.iter().map(|t| t.leader_id.clone()).collect();
            leader_ids.sort();
            leader_ids.dedup();
            let leaders = user_contacts(conn, &leader_ids)?;

            let mut parent_ids: Vec<String> =
                tasks.iter().filter_map(|t| t.parent_task_id.clone()).collect();
            parent_ids.sort();
            parent_ids.dedup();
            let parent_titles = parent_titles(conn, &parent_ids)?;

            let mut collaborators = collaborators_for(conn, &task_ids)?;
            let indicators = indicators_for(conn, viewer_id, EntityType::Task, &task_ids)?;
            let pinned = pinned_among(conn, viewer_id, &task_ids)?;

            Ok(tasks
                .into_iter()
                .map(|task| {
                    let (leader_name, leader_email) = leaders
                        .get(&task.leader_id)
                        .cloned()
                        .map(|(name, email)| (name, Some(email)))
                        .unwrap_or((None, None));
                    let parent_title = task
                        .parent_task_id
                        .as_ref()
                        .and_then(|id| parent_titles.get(id).cloned());
                    TaskView {
                        leader_name,
                        leader_email,
                        parent_title,
                        collaborators: collaborators.remove(&task.id).unwrap_or_default(),
                        discussion: indicators.get(&task.id).copied().unwrap_or_default(),
                        pinned: pinned.contains(&task.id),
                        task,
                    }
                })
                .collect())
        })
    }

    /// Attach creator, visible child count and discussion indicator to each
    /// parent task, as seen by `actor`. Order is preserved.
    pub fn parent_task_views(&self, actor: &Actor, parents: Vec<ParentTask>) -> Result<Vec<ParentTaskView>> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }
        let parent_ids: Vec<String> = parents.iter().map(|p| p.id.clone()).collect();

        let mut params: Vec<Value> = Vec::new();
        let in_list = bind_list(&mut params, &parent_ids);
        let clause = task_visibility_clause("t", actor, &mut params);
        let count_sql = format!(
            "SELECT t.parent_task_id, COUNT(*) FROM tasks t
             WHERE t.parent_task_id IN ({}) AND {}
             GROUP BY t.parent_task_id",
            in_list, clause
        );

        self.with_conn(|conn| {
            let mut creator_ids: Vec<String> =
                parents.iter().map(|p| p.created_by_user_id.clone()).collect();
            creator_ids.sort();
            creator_ids.dedup();
            let creators = user_contacts(conn, &creator_ids)?;

            let mut stmt = conn.prepare(&count_sql)?;
            let child_counts = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<rusqlite::Result<HashMap<_, _>>>()?;

            let indicators =
                indicators_for(conn, &actor.user_id, EntityType::ParentTask, &parent_ids)?;

            Ok(parents
                .into_iter()
                .map(|parent| {
                    let (created_by_name, created_by_email) = creators
                        .get(&parent.created_by_user_id)
                        .cloned()
                        .map(|(name, email)| (name, Some(email)))
                        .unwrap_or((None, None));
                    ParentTaskView {
                        created_by_name,
                        created_by_email,
                        child_count: child_counts.get(&parent.id).copied().unwrap_or(0),
                        discussion: indicators.get(&parent.id).copied().unwrap_or_default(),
                        parent_task: parent,
                    }
                })
                .collect())
        })
    }
}

/// (name, email) for each user id.
fn user_contacts(conn: &Connection, user_ids: &[String]) -> Result<HashMap<String, (Option<String>, String)>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, email FROM users WHERE id IN ({})",
        placeholders(user_ids.len())
    ))?;
    let contacts = stmt
        .query_map(params_from_iter(user_ids), |row| {
            Ok((row.get::<_, String>(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(contacts)
}

fn parent_titles(conn: &Connection, parent_ids: &[String]) -> Result<HashMap<String, String>> {
    if parent_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT id, title FROM parent_tasks WHERE id IN ({})",
        placeholders(parent_ids.len())
    ))?;
    let titles = stmt
        .query_map(params_from_iter(parent_ids), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_Off"), "%50\\%\\_off%");
    }
}
