//! Parent task storage.

use super::discussion::delete_thread;
use super::{Database, now_ms, parse_text};
use crate::types::{EntityType, ParentTask, Priority};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

pub(crate) const PARENT_TASK_COLUMNS: &str =
    "p.id, p.section, p.domain, p.title, p.topic, p.priority, p.created_by_user_id, p.created_at, p.updated_at";

pub(crate) fn parse_parent_task_row(row: &Row) -> rusqlite::Result<ParentTask> {
    let priority: String = row.get(5)?;
    Ok(ParentTask {
        id: row.get(0)?,
        section: row.get(1)?,
        domain: row.get(2)?,
        title: row.get(3)?,
        topic: row.get(4)?,
        priority: parse_text(5, &priority, Priority::from_str)?,
        created_by_user_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub(crate) fn get_parent_task_internal(conn: &Connection, id: &str) -> Result<Option<ParentTask>> {
    let parent = conn
        .query_row(
            &format!("SELECT {} FROM parent_tasks p WHERE p.id = ?1", PARENT_TASK_COLUMNS),
            params![id],
            parse_parent_task_row,
        )
        .optional()?;
    Ok(parent)
}

/// Validated fields for a new parent task.
#[derive(Debug, Clone)]
pub struct NewParentTask {
    pub section: String,
    pub domain: String,
    pub title: String,
    pub topic: String,
    pub priority: Priority,
    pub created_by_user_id: String,
}

/// Validated parent task edit; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ParentTaskChanges {
    pub section: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub priority: Option<Priority>,
}

impl Database {
    pub fn create_parent_task(&self, new: NewParentTask) -> Result<ParentTask> {
        let now = now_ms();
        let parent = ParentTask {
            id: Uuid::now_v7().to_string(),
            section: new.section,
            domain: new.domain,
            title: new.title,
            topic: new.topic,
            priority: new.priority,
            created_by_user_id: new.created_by_user_id,
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO parent_tasks
                    (id, section, domain, title, topic, priority, created_by_user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    &parent.id,
                    &parent.section,
                    &parent.domain,
                    &parent.title,
                    &parent.topic,
                    parent.priority.as_str(),
                    &parent.created_by_user_id,
                    parent.created_at,
                    parent.updated_at,
                ],
            )?;
            Ok(())
        })?;

        Ok(parent)
    }

    pub fn get_parent_task(&self, id: &str) -> Result<Option<ParentTask>> {
        self.with_conn(|conn| get_parent_task_internal(conn, id))
    }

    /// Apply changes to a parent task. Children keep the values they copied
    /// at creation.
    pub fn update_parent_task(&self, id: &str, changes: &ParentTaskChanges) -> Result<Option<ParentTask>> {
        self.with_conn(|conn| {
            let Some(mut parent) = get_parent_task_internal(conn, id)? else {
                return Ok(None);
            };

            if let Some(section) = &changes.section {
                parent.section = section.clone();
            }
            if let Some(domain) = &changes.domain {
                parent.domain = domain.clone();
            }
            if let Some(title) = &changes.title {
                parent.title = title.clone();
            }
            if let Some(topic) = &changes.topic {
                parent.topic = topic.clone();
            }
            if let Some(priority) = changes.priority {
                parent.priority = priority;
            }
            parent.updated_at = now_ms();

            conn.execute(
                "UPDATE parent_tasks
                 SET section = ?1, domain = ?2, title = ?3, topic = ?4, priority = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    &parent.section,
                    &parent.domain,
                    &parent.title,
                    &parent.topic,
                    parent.priority.as_str(),
                    parent.updated_at,
                    id,
                ],
            )?;

            Ok(Some(parent))
        })
    }

    /// Delete a parent task and its discussion. Children survive with their
    /// parent link cleared.
    pub fn delete_parent_task(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            delete_thread(&tx, EntityType::ParentTask, id)?;
            let deleted = tx.execute("DELETE FROM parent_tasks WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(deleted > 0)
        })
    }
}
