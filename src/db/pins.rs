//! Personal task pins.

use super::{Database, now_ms, placeholders};
use anyhow::Result;
use rusqlite::{Connection, params, params_from_iter};
use std::collections::HashSet;

/// Which of `task_ids` the user has pinned.
pub(crate) fn pinned_among(conn: &Connection, user_id: &str, task_ids: &[String]) -> Result<HashSet<String>> {
    if task_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT task_id FROM pinned_tasks WHERE user_id = ? AND task_id IN ({})",
        placeholders(task_ids.len())
    ))?;
    let args = std::iter::once(user_id).chain(task_ids.iter().map(String::as_str));
    let pinned = stmt
        .query_map(params_from_iter(args), |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<String>>>()?;
    Ok(pinned)
}

impl Database {
    /// Pin a task for a user. Pinning twice keeps a single row; returns false
    /// when the pin already existed.
    pub fn pin_task(&self, user_id: &str, task_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO pinned_tasks (user_id, task_id, pinned_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT DO NOTHING",
                params![user_id, task_id, now_ms()],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn unpin_task(&self, user_id: &str, task_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM pinned_tasks WHERE user_id = ?1 AND task_id = ?2",
                params![user_id, task_id],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Task ids the user has pinned, most recent first.
    pub fn pinned_task_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT task_id FROM pinned_tasks WHERE user_id = ?1
                 ORDER BY pinned_at DESC, task_id",
            )?;
            let ids = stmt
                .query_map(params![user_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(ids)
        })
    }
}
