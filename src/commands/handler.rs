//! Bot command handler trait and infrastructure
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Chat commands with a generic context, handlers return a [`Reply`]
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::database::StaffUser;
use crate::message_components::Reply;

/// One authorized command message
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Lowercase command name without the slash or `@botname`
    pub command: String,
    /// Everything after the command, trimmed
    pub args: String,
    pub chat_id: i64,
    pub user: StaffUser,
}

/// Trait for bot command handlers
///
/// Each handler processes one or more commands against a shared context `C`
/// (the bot's service) and returns the reply to send.
///
/// # Example
///
/// ```ignore
/// pub struct HelpHandler;
///
/// #[async_trait]
/// impl CommandHandler<AssistantService> for HelpHandler {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["help"]
///     }
///
///     async fn handle(&self, ctx: Arc<AssistantService>, _: &Invocation) -> Result<Reply> {
///         Ok(ctx.help())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler<C: Send + Sync + 'static>: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> &'static [&'static str];

    async fn handle(&self, ctx: Arc<C>, invocation: &Invocation) -> Result<Reply>;
}

/// Split `/name@bot args` into `("name", "args")`. Non-commands give `None`.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim_start();
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn CommandHandler<()>) {}

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("/note Mary Tan: ate well"),
            Some(("note".to_string(), "Mary Tan: ate well".to_string()))
        );
        assert_eq!(
            parse_command("/Start@CareAssistantBot"),
            Some(("start".to_string(), String::new()))
        );
        assert_eq!(parse_command("how is mary"), None);
        assert_eq!(parse_command("/"), None);
    }
}
