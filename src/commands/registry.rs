//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Generic over the bot context, auth-gated dispatch
//! - 1.0.0: Initial implementation for handler dispatch

use log::{error, info};
use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{parse_command, CommandHandler, Invocation};
use crate::features::auth::{Authorizer, UNAUTHORIZED_MESSAGE};
use crate::features::responses::templates;
use crate::message_components::Reply;

/// Registry mapping command names to handlers
///
/// Multiple command names can map to the same handler if they share logic.
pub struct CommandRegistry<C: Send + Sync + 'static> {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler<C>>>,
}

impl<C: Send + Sync + 'static> CommandRegistry<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for its declared command names
    pub fn register(&mut self, handler: Arc<dyn CommandHandler<C>>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler<C>>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered command names
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route a message to its handler.
    ///
    /// Returns `None` when the text is not a command. Unauthorized senders get
    /// the rejection text and the handler never runs; handler errors become
    /// the generic error reply.
    pub async fn dispatch(
        &self,
        ctx: Arc<C>,
        authorizer: &Authorizer,
        handle: Option<&str>,
        chat_id: i64,
        text: &str,
    ) -> Option<Reply> {
        let (command, args) = parse_command(text)?;

        let Some(user) = authorizer.authorize(handle).await else {
            return Some(Reply::plain(UNAUTHORIZED_MESSAGE));
        };

        let Some(handler) = self.get(&command) else {
            info!("Unknown command /{command} from {}", user.name);
            return Some(Reply::plain(templates::UNKNOWN_COMMAND));
        };

        let invocation = Invocation {
            command,
            args,
            chat_id,
            user,
        };
        match handler.handle(ctx, &invocation).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!("Error handling /{}: {e}", invocation.command);
                Some(Reply::plain(templates::ERROR))
            }
        }
    }
}

impl<C: Send + Sync + 'static> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
