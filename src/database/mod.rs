//! # Database
//!
//! SQLite store for staff users, residents, resident notes, tasks and activities.
//! Cheap to clone; all clones share one connection.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Care-facility schema (users, residents, notes, tasks, activities)
//! - 1.0.0: Initial release

mod activities;
pub mod models;
mod residents;
mod tasks;
mod users;

pub use activities::ActivityFilter;
pub use models::{
    Activity, Resident, ResidentNote, StaffUser, Task, TaskPriority, TaskStatus,
};
pub use tasks::TaskFilter;

use anyhow::Result;
use log::info;
use sqlite::{Connection, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL DEFAULT '',
        role TEXT NOT NULL DEFAULT '',
        telegram_handle TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS residents (
        id TEXT PRIMARY KEY,
        full_name TEXT NOT NULL,
        room_number TEXT NOT NULL DEFAULT '',
        gender TEXT NOT NULL DEFAULT '',
        medical_conditions TEXT NOT NULL DEFAULT '[]',
        medications TEXT NOT NULL DEFAULT '[]'
    );
    CREATE TABLE IF NOT EXISTS resident_notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        resident_id TEXT NOT NULL,
        text TEXT NOT NULL,
        created_by TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        task_title TEXT NOT NULL,
        task_details TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'Pending',
        priority TEXT NOT NULL DEFAULT '',
        start_date TEXT NOT NULL DEFAULT '',
        due_date TEXT NOT NULL DEFAULT '',
        assigned_to TEXT NOT NULL DEFAULT '',
        assigned_for TEXT NOT NULL DEFAULT '',
        recurring INTEGER NOT NULL DEFAULT 0,
        recurring_days TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS activities (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        start_time TEXT NOT NULL DEFAULT '',
        end_time TEXT NOT NULL DEFAULT '',
        created_by TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_start ON tasks(start_date);
    CREATE INDEX IF NOT EXISTS idx_tasks_assigned_for ON tasks(assigned_for);
    CREATE INDEX IF NOT EXISTS idx_activities_start ON activities(start_time);
    CREATE INDEX IF NOT EXISTS idx_notes_resident ON resident_notes(resident_id);
";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub async fn new(path: &str) -> Result<Self> {
        let connection = sqlite::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open database {}: {}", path, e))?;
        connection.execute(SCHEMA)?;
        info!("📦 Database ready at {path}");
        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Private in-memory database, used by tests and dry runs
    pub async fn in_memory() -> Result<Self> {
        let connection = sqlite::open(":memory:")?;
        connection.execute(SCHEMA)?;
        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

/// Positional SQL parameter
#[derive(Debug, Clone)]
pub(crate) enum Param {
    Text(String),
    Int(i64),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

pub(crate) fn bind_all(statement: &mut Statement<'_>, params: &[Param]) -> Result<()> {
    for (i, param) in params.iter().enumerate() {
        match param {
            Param::Text(text) => statement.bind((i + 1, text.as_str()))?,
            Param::Int(value) => statement.bind((i + 1, *value))?,
        }
    }
    Ok(())
}

/// Run a statement that returns no rows
pub(crate) fn execute_with(connection: &Connection, sql: &str, params: &[Param]) -> Result<()> {
    let mut statement = connection.prepare(sql)?;
    bind_all(&mut statement, params)?;
    while statement.next()? != sqlite::State::Done {}
    Ok(())
}

/// Empty strings stand in for NULL in the schema
pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub(crate) fn like_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let conn = db.connection.lock().await;
        conn.execute(SCHEMA).unwrap();
    }

    #[test]
    fn test_like_escape() {
        assert_eq!(like_escape("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(like_escape("mary"), "mary");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}
