//! Per-user topic grants.

use super::Database;
use crate::types::UserTopic;
use anyhow::Result;
use rusqlite::{Connection, params};

pub(crate) fn user_topics_internal(conn: &Connection, user_id: &str) -> Result<Vec<UserTopic>> {
    let mut stmt = conn.prepare(
        "SELECT section, topic FROM user_topics WHERE user_id = ?1 ORDER BY section, topic",
    )?;
    let topics = stmt
        .query_map(params![user_id], |row| {
            Ok(UserTopic {
                section: row.get(0)?,
                topic: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(topics)
}

impl Database {
    pub fn user_topics(&self, user_id: &str) -> Result<Vec<UserTopic>> {
        self.with_conn(|conn| user_topics_internal(conn, user_id))
    }

    /// Grant a topic. Returns false when the grant already existed.
    pub fn add_user_topic(&self, user_id: &str, section: &str, topic: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO user_topics (user_id, section, topic) VALUES (?1, ?2, ?3)
                 ON CONFLICT DO NOTHING",
                params![user_id, section, topic],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Revoke a topic. Returns false when there was nothing to revoke.
    pub fn remove_user_topic(&self, user_id: &str, section: &str, topic: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM user_topics WHERE user_id = ?1 AND section = ?2 AND topic = ?3",
                params![user_id, section, topic],
            )?;
            Ok(deleted > 0)
        })
    }
}
