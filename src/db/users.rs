//! Users and login sessions.

use super::{Database, now_ms, parse_text, placeholders};
use crate::error::{ApiError, is_unique_violation};
use crate::types::{Role, User};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashSet;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, name, role, created_at";

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: parse_text(3, &role, Role::from_str)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn get_user_internal(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![user_id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

impl Database {
    /// Insert a new member. Fails with `CONFLICT` when the email is taken.
    pub fn create_user(&self, email: &str, name: Option<&str>, password_hash: &str) -> Result<User> {
        let user = User {
            id: Uuid::now_v7().to_string(),
            email: email.to_string(),
            name: name.map(String::from),
            role: Role::Member,
            created_at: now_ms(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, password_hash, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &user.id,
                    &user.email,
                    &user.name,
                    password_hash,
                    user.role.as_str(),
                    user.created_at
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    anyhow::Error::new(ApiError::conflict("email is already registered"))
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })?;

        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_internal(conn, user_id))
    }

    /// Look up a user together with their password hash.
    pub fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    &format!(
                        "SELECT {}, password_hash FROM users WHERE email = ?1",
                        USER_COLUMNS
                    ),
                    params![email],
                    |row| Ok((parse_user_row(row)?, row.get::<_, String>(5)?)),
                )
                .optional()?;
            Ok(found)
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users ORDER BY COALESCE(name, email) COLLATE NOCASE, email",
                USER_COLUMNS
            ))?;
            let users = stmt
                .query_map([], parse_user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    /// Change a user's role. Returns the updated user, or `None` if absent.
    pub fn set_user_role(&self, user_id: &str, role: Role) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                params![role.as_str(), user_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            get_user_internal(conn, user_id)
        })
    }

    pub fn set_user_role_by_email(&self, email: &str, role: Role) -> Result<Option<User>> {
        let user_id = self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT id FROM users WHERE email = ?1",
                    params![email],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(id)
        })?;
        match user_id {
            Some(id) => self.set_user_role(&id, role),
            None => Ok(None),
        }
    }

    /// Ids from `user_ids` that do not belong to any user.
    pub fn missing_users(&self, user_ids: &[String]) -> Result<Vec<String>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id FROM users WHERE id IN ({})",
                placeholders(user_ids.len())
            ))?;
            let found: HashSet<String> = stmt
                .query_map(params_from_iter(user_ids), |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            Ok(user_ids
                .iter()
                .filter(|id| !found.contains(*id))
                .cloned()
                .collect())
        })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Start a session and return its token.
    pub fn create_session(&self, user_id: &str, ttl_ms: i64) -> Result<String> {
        let token = Uuid::new_v4().simple().to_string();
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![&token, user_id, now, now.saturating_add(ttl_ms)],
            )?;
            Ok(())
        })?;
        Ok(token)
    }

    /// Resolve a token to its user. Expired and unknown tokens yield `None`.
    pub fn session_user(&self, token: &str) -> Result<Option<User>> {
        let now = now_ms();
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT u.id, u.email, u.name, u.role, u.created_at
                     FROM sessions s JOIN users u ON u.id = s.user_id
                     WHERE s.token = ?1 AND s.expires_at > ?2",
                    params![token, now],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn delete_session(&self, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
            Ok(deleted > 0)
        })
    }

    /// Remove sessions past their expiry. Returns how many were removed.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let now = now_ms();
        self.with_conn(|conn| {
            let purged = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
            Ok(purged)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn duplicate_email_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("a@example.com", Some("A"), "hash").unwrap();
        let err = db.create_user("a@example.com", None, "hash").unwrap_err();
        assert_eq!(ApiError::from(err).code, ErrorCode::Conflict);
    }

    #[test]
    fn sessions_expire() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("a@example.com", None, "hash").unwrap();

        let live = db.create_session(&user.id, 60_000).unwrap();
        let expired = db.create_session(&user.id, -1).unwrap();

        assert_eq!(db.session_user(&live).unwrap().unwrap().id, user.id);
        assert!(db.session_user(&expired).unwrap().is_none());
        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(db.delete_session(&live).unwrap());
        assert!(db.session_user(&live).unwrap().is_none());
    }

    #[test]
    fn missing_users_reports_unknown_ids() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("a@example.com", None, "hash").unwrap();
        let missing = db
            .missing_users(&[user.id.clone(), "ghost".to_string()])
            .unwrap();
        assert_eq!(missing, vec!["ghost".to_string()]);
    }
}
