//! Discussion threads and per-user read markers.
//!
//! Messages are append-only. A user's read marker only moves forward, so
//! concurrent fetches by the same user can never rewind it.

use super::{Database, now_ms, parse_text, placeholders};
use crate::types::{DiscussionIndicator, DiscussionMessage, EntityType};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::HashMap;
use uuid::Uuid;

fn mark_read_internal(
    conn: &Connection,
    user_id: &str,
    entity_type: EntityType,
    entity_id: &str,
    at: i64,
) -> Result<i64> {
    let last_read_at = conn.query_row(
        "INSERT INTO discussion_read_states (user_id, entity_type, entity_id, last_read_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, entity_type, entity_id)
         DO UPDATE SET last_read_at = MAX(last_read_at, excluded.last_read_at)
         RETURNING last_read_at",
        params![user_id, entity_type.as_str(), entity_id, at],
        |row| row.get(0),
    )?;
    Ok(last_read_at)
}

fn messages_internal(
    conn: &Connection,
    entity_type: EntityType,
    entity_id: &str,
) -> Result<Vec<DiscussionMessage>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.entity_type, m.entity_id, m.author_id, u.name, u.email, m.content, m.created_at
         FROM discussion_messages m
         LEFT JOIN users u ON u.id = m.author_id
         WHERE m.entity_type = ?1 AND m.entity_id = ?2
         ORDER BY m.created_at ASC, m.id ASC",
    )?;
    let messages = stmt
        .query_map(params![entity_type.as_str(), entity_id], |row| {
            let kind: String = row.get(1)?;
            Ok(DiscussionMessage {
                id: row.get(0)?,
                entity_type: parse_text(1, &kind, EntityType::from_str)?,
                entity_id: row.get(2)?,
                author_id: row.get(3)?,
                author_name: row.get(4)?,
                author_email: row.get(5)?,
                content: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(messages)
}

/// Drop a thread and everyone's read markers for it.
pub(crate) fn delete_thread(conn: &Connection, entity_type: EntityType, entity_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM discussion_messages WHERE entity_type = ?1 AND entity_id = ?2",
        params![entity_type.as_str(), entity_id],
    )?;
    conn.execute(
        "DELETE FROM discussion_read_states WHERE entity_type = ?1 AND entity_id = ?2",
        params![entity_type.as_str(), entity_id],
    )?;
    Ok(())
}

/// Unread indicators for each entity in `entity_ids` as seen by `user_id`.
/// Entities without messages are absent from the map.
pub(crate) fn indicators_for(
    conn: &Connection,
    user_id: &str,
    entity_type: EntityType,
    entity_ids: &[String],
) -> Result<HashMap<String, DiscussionIndicator>> {
    if entity_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT m.entity_id,
                COUNT(*),
                SUM(CASE WHEN rs.last_read_at IS NULL OR m.created_at > rs.last_read_at
                         THEN 1 ELSE 0 END)
         FROM discussion_messages m
         LEFT JOIN discussion_read_states rs
           ON rs.user_id = ? AND rs.entity_type = m.entity_type AND rs.entity_id = m.entity_id
         WHERE m.entity_type = ? AND m.entity_id IN ({})
         GROUP BY m.entity_id",
        placeholders(entity_ids.len())
    ))?;
    let args = [user_id, entity_type.as_str()]
        .into_iter()
        .chain(entity_ids.iter().map(String::as_str));
    let rows = stmt.query_map(params_from_iter(args), |row| {
        let count: i64 = row.get(1)?;
        let unread: i64 = row.get(2)?;
        Ok((
            row.get::<_, String>(0)?,
            DiscussionIndicator {
                count,
                unread,
                has_unread: unread > 0,
            },
        ))
    })?;

    let mut indicators = HashMap::new();
    for row in rows {
        let (id, indicator) = row?;
        indicators.insert(id, indicator);
    }
    Ok(indicators)
}

impl Database {
    /// Append a message to a thread. The author's read marker moves to the
    /// message; nobody else's changes.
    pub fn post_message(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<DiscussionMessage> {
        let id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO discussion_messages (id, entity_type, entity_id, author_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![&id, entity_type.as_str(), entity_id, author_id, content, now],
            )?;
            mark_read_internal(&tx, author_id, entity_type, entity_id, now)?;

            let (author_name, author_email) = tx.query_row(
                "SELECT name, email FROM users WHERE id = ?1",
                params![author_id],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, String>(1)?)),
            )?;
            tx.commit()?;

            Ok(DiscussionMessage {
                id,
                entity_type,
                entity_id: entity_id.to_string(),
                author_id: author_id.to_string(),
                author_name,
                author_email: Some(author_email),
                content: content.to_string(),
                created_at: now,
            })
        })
    }

    /// All messages on a thread, oldest first.
    pub fn messages(&self, entity_type: EntityType, entity_id: &str) -> Result<Vec<DiscussionMessage>> {
        self.with_conn(|conn| messages_internal(conn, entity_type, entity_id))
    }

    /// Fetch a thread for `user_id` and move their read marker to the newest
    /// message returned. Both happen under one lock, so a message is never
    /// marked read without having been fetched.
    pub fn read_thread(
        &self,
        user_id: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Vec<DiscussionMessage>> {
        self.with_conn(|conn| {
            let messages = messages_internal(conn, entity_type, entity_id)?;
            if let Some(newest) = messages.iter().map(|m| m.created_at).max() {
                mark_read_internal(conn, user_id, entity_type, entity_id, newest)?;
            }
            Ok(messages)
        })
    }

    /// Move the user's read marker to now. Idempotent; the stored marker
    /// never decreases. Returns the stored marker.
    pub fn mark_read(&self, user_id: &str, entity_type: EntityType, entity_id: &str) -> Result<i64> {
        let now = now_ms();
        self.with_conn(|conn| mark_read_internal(conn, user_id, entity_type, entity_id, now))
    }

    pub fn last_read_at(&self, user_id: &str, entity_type: EntityType, entity_id: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let at = conn
                .query_row(
                    "SELECT last_read_at FROM discussion_read_states
                     WHERE user_id = ?1 AND entity_type = ?2 AND entity_id = ?3",
                    params![user_id, entity_type.as_str(), entity_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(at)
        })
    }

    /// Point-in-time unread indicator for one thread.
    pub fn unread_indicator(
        &self,
        user_id: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<DiscussionIndicator> {
        self.with_conn(|conn| {
            let mut indicators = indicators_for(conn, user_id, entity_type, &[entity_id.to_string()])?;
            Ok(indicators.remove(entity_id).unwrap_or_default())
        })
    }
}
