use anyhow::Result;
use log::debug;
use sqlite::State;

use super::{bind_all, execute_with, Database, Param, StaffUser};

/// Lowercase, trimmed, without any `@`
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().replace('@', "").to_lowercase()
}

impl Database {
    pub async fn add_user(&self, user: &StaffUser) -> Result<()> {
        let conn = self.connection.lock().await;
        execute_with(
            &conn,
            "INSERT OR REPLACE INTO users (id, name, email, role, telegram_handle)
             VALUES (?, ?, ?, ?, ?)",
            &[
                user.id.as_str().into(),
                user.name.as_str().into(),
                user.email.as_str().into(),
                user.role.as_str().into(),
                user.telegram_handle.as_str().into(),
            ],
        )
    }

    /// Find a staff user by chat handle, ignoring case, surrounding whitespace and `@`
    pub async fn find_user_by_handle(&self, handle: &str) -> Result<Option<StaffUser>> {
        let normalized = normalize_handle(handle);
        if normalized.is_empty() {
            return Ok(None);
        }
        debug!("Looking up staff user with handle: {normalized}");

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT id, name, email, role, telegram_handle FROM users
             WHERE LOWER(TRIM(REPLACE(telegram_handle, '@', ''))) = ?
             LIMIT 1",
        )?;
        bind_all(&mut statement, &[Param::Text(normalized)])?;

        if let State::Row = statement.next()? {
            Ok(Some(StaffUser {
                id: statement.read::<String, _>("id")?,
                name: statement.read::<String, _>("name")?,
                email: statement.read::<String, _>("email")?,
                role: statement.read::<String, _>("role")?,
                telegram_handle: statement.read::<String, _>("telegram_handle")?,
            }))
        } else {
            Ok(None)
        }
    }
}
