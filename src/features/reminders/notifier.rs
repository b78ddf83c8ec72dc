//! Outbound chat messages for reminders

use anyhow::Result;
use async_trait::async_trait;

/// Delivers a message to one chat
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str, markdown: bool) -> Result<()>;
}
