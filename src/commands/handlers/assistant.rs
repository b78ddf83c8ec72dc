//! Assistant bot command handlers
//!
//! Handles: start, help, residents, tasks, activities, note

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::handler::{CommandHandler, Invocation};
use crate::features::assistant::AssistantService;
use crate::message_components::Reply;

/// Handler for /start and /help
pub struct GreetingHandler;

#[async_trait]
impl CommandHandler<AssistantService> for GreetingHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["start", "help"]
    }

    async fn handle(&self, ctx: Arc<AssistantService>, invocation: &Invocation) -> Result<Reply> {
        match invocation.command.as_str() {
            "start" => {
                info!("👋 {} started the assistant bot", invocation.user.name);
                Ok(ctx.welcome(&invocation.user))
            }
            _ => Ok(ctx.help()),
        }
    }
}

/// Handler for the listing commands: residents, tasks, activities
pub struct LookupHandler;

#[async_trait]
impl CommandHandler<AssistantService> for LookupHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["residents", "tasks", "activities"]
    }

    async fn handle(&self, ctx: Arc<AssistantService>, invocation: &Invocation) -> Result<Reply> {
        let reply = match invocation.command.as_str() {
            "residents" => ctx.list_residents().await,
            "tasks" => ctx.today_tasks().await,
            _ => ctx.today_activities().await,
        };
        Ok(reply)
    }
}

/// Handler for /note
pub struct NoteHandler;

#[async_trait]
impl CommandHandler<AssistantService> for NoteHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["note"]
    }

    async fn handle(&self, ctx: Arc<AssistantService>, invocation: &Invocation) -> Result<Reply> {
        Ok(ctx.add_note(&invocation.user, &invocation.args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::assistant_registry;
    use crate::database::{Database, Resident, StaffUser};
    use crate::features::assistant::NOTE_USAGE;
    use crate::features::auth::Authorizer;
    use chrono::FixedOffset;

    async fn setup() -> (Arc<AssistantService>, Authorizer) {
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
        db.add_resident(&Resident {
            id: "r1".to_string(),
            full_name: "Mary Tan".to_string(),
            room_number: Some("101".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let service = AssistantService::new(db.clone(), offset).unwrap();
        (Arc::new(service), Authorizer::new(db))
    }

    #[tokio::test]
    async fn test_start_greets_by_name() {
        let (service, auth) = setup().await;
        let reply = assistant_registry()
            .dispatch(service, &auth, Some("@Nora"), 1, "/start")
            .await
            .unwrap();
        assert!(reply.text.starts_with("Welcome, Nora!"));
    }

    #[tokio::test]
    async fn test_residents_command() {
        let (service, auth) = setup().await;
        let reply = assistant_registry()
            .dispatch(service, &auth, Some("nora"), 1, "/residents")
            .await
            .unwrap();
        assert!(reply.markdown);
        assert!(reply.text.contains("*Mary Tan* (Room: 101)"));
    }

    #[tokio::test]
    async fn test_note_command() {
        let (service, auth) = setup().await;
        let registry = assistant_registry();
        let reply = registry
            .dispatch(service.clone(), &auth, Some("nora"), 1, "/note")
            .await
            .unwrap();
        assert_eq!(reply.text, NOTE_USAGE);

        let reply = registry
            .dispatch(service, &auth, Some("nora"), 1, "/note Mary Tan: Slept well")
            .await
            .unwrap();
        assert_eq!(reply.text, "📝 Note added for Mary Tan.");
    }
}
