//! Task collaborators.

use super::{Database, placeholders};
use crate::types::Collaborator;
use anyhow::Result;
use rusqlite::{Connection, params, params_from_iter};
use std::collections::HashMap;

pub(crate) fn collaborator_ids_internal(conn: &Connection, task_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT user_id FROM task_collaborators WHERE task_id = ?1")?;
    let ids = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// Collaborators of each task in `task_ids`, keyed by task id.
pub(crate) fn collaborators_for(
    conn: &Connection,
    task_ids: &[String],
) -> Result<HashMap<String, Vec<Collaborator>>> {
    let mut by_task: HashMap<String, Vec<Collaborator>> = HashMap::new();
    if task_ids.is_empty() {
        return Ok(by_task);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT c.task_id, u.id, u.name, u.email, c.role
         FROM task_collaborators c JOIN users u ON u.id = c.user_id
         WHERE c.task_id IN ({})
         ORDER BY COALESCE(u.name, u.email) COLLATE NOCASE",
        placeholders(task_ids.len())
    ))?;
    let rows = stmt.query_map(params_from_iter(task_ids), |row| {
        Ok((
            row.get::<_, String>(0)?,
            Collaborator {
                id: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                role: row.get(4)?,
            },
        ))
    })?;
    for row in rows {
        let (task_id, collaborator) = row?;
        by_task.entry(task_id).or_default().push(collaborator);
    }
    Ok(by_task)
}

impl Database {
    pub fn collaborators(&self, task_id: &str) -> Result<Vec<Collaborator>> {
        self.with_conn(|conn| {
            let mut by_task = collaborators_for(conn, &[task_id.to_string()])?;
            Ok(by_task.remove(task_id).unwrap_or_default())
        })
    }

    /// Add a collaborator. Returns false if they already were one.
    pub fn add_collaborator(&self, task_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO task_collaborators (task_id, user_id, role)
                 VALUES (?1, ?2, 'collaborator')
                 ON CONFLICT DO NOTHING",
                params![task_id, user_id],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Remove a collaborator. Returns false if they were not one.
    pub fn remove_collaborator(&self, task_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM task_collaborators WHERE task_id = ?1 AND user_id = ?2",
                params![task_id, user_id],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn is_collaborator(&self, task_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let ids = collaborator_ids_internal(conn, task_id)?;
            Ok(ids.iter().any(|id| id == user_id))
        })
    }
}
