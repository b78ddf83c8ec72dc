//! # Command System
//!
//! Slash command (`/start`, `/tasks`, ...) handling for both chat bots.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Chat bot commands, handlers generic over the bot service
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod handler;
pub mod handlers;
pub mod registry;

pub use handler::{parse_command, CommandHandler, Invocation};
pub use handlers::{assistant_registry, reminders_registry};
pub use registry::CommandRegistry;
