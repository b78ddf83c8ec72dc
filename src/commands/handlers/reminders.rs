//! Reminders bot command handlers
//!
//! Handles: start, stop, refresh

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use crate::commands::handler::{CommandHandler, Invocation};
use crate::features::reminders::{RegisteredChat, ReminderService};
use crate::message_components::Reply;

pub const REFRESH_ACK: &str =
    "🔃 Fetching the latest activities, tasks and medication reminders for you 🔃";

/// Handler for /start and /stop
pub struct SubscriptionHandler;

#[async_trait]
impl CommandHandler<ReminderService> for SubscriptionHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["start", "stop"]
    }

    async fn handle(&self, ctx: Arc<ReminderService>, invocation: &Invocation) -> Result<Reply> {
        let user = &invocation.user;
        if invocation.command == "stop" {
            ctx.chats().unregister(&user.id);
            let cleared = ctx.clear_medications(&user.id);
            info!("🔕 {} stopped reminders ({cleared} medication jobs dropped)", user.name);
            return Ok(Reply::plain(
                "🔕 Reminders stopped. Send /start to receive them again.",
            ));
        }

        ctx.chats().register(&user.id, invocation.chat_id, &user.name);
        let chat = RegisteredChat {
            chat_id: invocation.chat_id,
            name: user.name.clone(),
        };
        let queued = ctx
            .queue_medications_for(&user.id, &chat, ctx.local_now())
            .await;

        Ok(Reply::plain(format!(
            "Hello {}! 🔔 You will now receive activity, task, medication and fall \
             reminders in this chat.\n\n💊 {queued} medication reminder(s) queued for today.",
            user.name
        )))
    }
}

/// Handler for /refresh
pub struct RefreshHandler;

#[async_trait]
impl CommandHandler<ReminderService> for RefreshHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["refresh"]
    }

    async fn handle(&self, ctx: Arc<ReminderService>, invocation: &Invocation) -> Result<Reply> {
        let user = &invocation.user;
        if let Err(e) = ctx
            .notifier()
            .send(invocation.chat_id, REFRESH_ACK, false)
            .await
        {
            warn!("Failed to acknowledge refresh for {}: {e}", user.name);
        }

        ctx.chats().register(&user.id, invocation.chat_id, &user.name);
        ctx.run_polling_passes().await;

        let chat = RegisteredChat {
            chat_id: invocation.chat_id,
            name: user.name.clone(),
        };
        let queued = ctx
            .queue_medications_for(&user.id, &chat, ctx.local_now())
            .await;
        info!("🔃 Refreshed reminders for {}", user.name);

        Ok(Reply::plain(format!(
            "✅ Reminders refreshed. 💊 {queued} medication reminder(s) queued for the rest of today."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::reminders_registry;
    use crate::database::{Database, StaffUser};
    use crate::features::auth::Authorizer;
    use crate::features::reminders::notifier::testing::RecordingNotifier;
    use crate::features::reminders::test_service;
    use crate::platform::testing::StubPlatform;

    async fn authorizer() -> Authorizer {
        let db = Database::in_memory().await.unwrap();
        db.add_user(&StaffUser {
            id: "u1".to_string(),
            name: "Nora".to_string(),
            email: "nora@example.com".to_string(),
            role: "caregiver".to_string(),
            telegram_handle: "nora".to_string(),
        })
        .await
        .unwrap();
        Authorizer::new(db)
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let auth = authorizer().await;
        let service = Arc::new(test_service(
            Arc::new(StubPlatform::default()),
            Arc::new(RecordingNotifier::default()),
        ));
        let registry = reminders_registry();

        let reply = registry
            .dispatch(service.clone(), &auth, Some("nora"), 42, "/start")
            .await
            .unwrap();
        assert!(reply.text.starts_with("Hello Nora!"));
        assert!(reply.text.contains("0 medication reminder(s)"));
        assert_eq!(service.chats().get("u1").unwrap().chat_id, 42);

        registry
            .dispatch(service.clone(), &auth, Some("nora"), 42, "/stop")
            .await
            .unwrap();
        assert!(service.chats().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_acknowledges_first() {
        let auth = authorizer().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let service = Arc::new(test_service(
            Arc::new(StubPlatform::default()),
            notifier.clone(),
        ));

        let reply = reminders_registry()
            .dispatch(service.clone(), &auth, Some("nora"), 42, "/refresh")
            .await
            .unwrap();
        assert!(reply.text.starts_with("✅ Reminders refreshed."));
        assert_eq!(notifier.messages(), vec![(42, REFRESH_ACK.to_string(), false)]);
        assert_eq!(service.chats().len(), 1);
    }

    #[tokio::test]
    async fn test_strangers_are_not_registered() {
        let auth = authorizer().await;
        let service = Arc::new(test_service(
            Arc::new(StubPlatform::default()),
            Arc::new(RecordingNotifier::default()),
        ));
        reminders_registry()
            .dispatch(service.clone(), &auth, Some("mallory"), 7, "/start")
            .await
            .unwrap();
        assert!(service.chats().is_empty());
    }
}
