//! Domain list.

use super::{Database, now_ms};
use crate::error::{ApiError, is_unique_violation};
use crate::types::Domain;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

impl Database {
    pub fn list_domains(&self) -> Result<Vec<Domain>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, created_at FROM domains ORDER BY name COLLATE NOCASE")?;
            let domains = stmt
                .query_map([], |row| {
                    Ok(Domain {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(domains)
        })
    }

    /// Add a domain. A taken name is a `CONFLICT`.
    pub fn create_domain(&self, name: &str) -> Result<Domain> {
        let domain = Domain {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            created_at: now_ms(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO domains (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![&domain.id, &domain.name, domain.created_at],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    anyhow::Error::new(ApiError::conflict(format!(
                        "domain '{}' already exists",
                        domain.name
                    )))
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })?;
        Ok(domain)
    }

    /// Delete a domain. Refused with `CONFLICT` while a task or parent task
    /// still uses it; returns false when the domain does not exist.
    pub fn delete_domain(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let name: Option<String> = tx
                .query_row("SELECT name FROM domains WHERE id = ?1", params![id], |row| row.get(0))
                .optional()?;
            let Some(name) = name else {
                return Ok(false);
            };

            let in_use: i64 = tx.query_row(
                "SELECT (SELECT COUNT(*) FROM tasks WHERE domain = ?1)
                      + (SELECT COUNT(*) FROM parent_tasks WHERE domain = ?1)",
                params![&name],
                |row| row.get(0),
            )?;
            if in_use > 0 {
                return Err(ApiError::conflict(format!(
                    "domain '{}' is used by {} task(s)",
                    name, in_use
                ))
                .into());
            }

            tx.execute("DELETE FROM domains WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Insert any of `names` not already present. Returns how many were added.
    pub fn seed_domains(&self, names: &[String]) -> Result<usize> {
        let now = now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut added = 0;
            for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
                added += tx.execute(
                    "INSERT INTO domains (id, name, created_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT (name) DO NOTHING",
                    params![Uuid::now_v7().to_string(), name, now],
                )?;
            }
            tx.commit()?;
            Ok(added)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn seeding_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let names = vec!["Sales".to_string(), "Support".to_string()];
        assert_eq!(db.seed_domains(&names).unwrap(), 2);
        assert_eq!(db.seed_domains(&names).unwrap(), 0);
        assert_eq!(db.list_domains().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_domain_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_domain("Sales").unwrap();
        let err = ApiError::from(db.create_domain("Sales").unwrap_err());
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn delete_unknown_domain_returns_false() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.delete_domain("nope").unwrap());
    }
}
