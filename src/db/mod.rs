//! Database layer for the task board.

pub mod collaborators;
pub mod discussion;
pub mod domains;
pub mod parent_tasks;
pub mod pins;
pub mod tasks;
pub mod topics;
pub mod users;
pub mod visibility;

use anyhow::{Result, anyhow};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// SQL functions the queries rely on.
///
/// `fold_case(text)` lowercases with full Unicode case mapping. The built-in
/// `LOWER()` only folds ASCII, so search compares `fold_case` on both sides.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path and apply pending migrations.
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a writer holds the lock
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout={};",
            busy_timeout_ms
        ))?;
        register_functions(&conn)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        register_functions(&conn)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let report = embedded::migrations::runner().run(&mut *conn)?;
        for migration in report.applied_migrations() {
            tracing::info!(version = migration.version(), name = migration.name(), "Applied migration");
        }
        Ok(())
    }

    /// Highest applied migration version.
    pub fn schema_version(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let version = conn
                .query_row(
                    "SELECT MAX(version) FROM refinery_schema_history",
                    [],
                    |row| row.get::<_, Option<i64>>(0),
                )
                .optional()?;
            Ok(version.flatten())
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Decode a text column through one of the `from_str` enum parsers.
pub(crate) fn parse_text<T>(idx: usize, value: &str, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{}'", value).into(),
        )
    })
}

/// `?, ?, ?` placeholder list for an IN clause.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Push a parameter for a dynamically built statement and return its
/// numbered placeholder.
pub(crate) fn bind(params: &mut Vec<Value>, value: impl Into<Value>) -> String {
    params.push(value.into());
    format!("?{}", params.len())
}

/// Numbered placeholders for an IN clause in a dynamically built statement.
pub(crate) fn bind_list(params: &mut Vec<Value>, values: &[String]) -> String {
    values
        .iter()
        .map(|v| bind(params, v.clone()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_database_migrates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.db");

        let db = Database::open(&path, 1_000).unwrap();
        assert_eq!(db.schema_version().unwrap(), Some(1));
        drop(db);

        // Reopening applies nothing new
        let db = Database::open(&path, 1_000).unwrap();
        assert_eq!(db.schema_version().unwrap(), Some(1));
    }

    #[test]
    fn bind_numbers_placeholders_in_order() {
        let mut params = Vec::new();
        assert_eq!(bind(&mut params, "a".to_string()), "?1");
        assert_eq!(bind_list(&mut params, &["b".into(), "c".into()]), "?2, ?3");
        assert_eq!(params.len(), 3);
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn fold_case_lowercases_beyond_ascii() {
        let db = Database::open_in_memory().unwrap();
        let folded: Option<String> = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT fold_case('ÉCOLE Straße')", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(folded.as_deref(), Some("école straße"));

        let null: Option<String> = db
            .with_conn(|conn| Ok(conn.query_row("SELECT fold_case(NULL)", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(null, None);
    }
}
