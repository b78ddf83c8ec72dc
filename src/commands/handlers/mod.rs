//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 3.0.0: Assistant and reminders bot commands
//! - 1.0.0: Initial extraction from monolithic command_handler.rs

pub mod assistant;
pub mod reminders;

use std::sync::Arc;

use super::registry::CommandRegistry;
use crate::features::assistant::AssistantService;
use crate::features::reminders::ReminderService;

/// Registry with every assistant bot command
pub fn assistant_registry() -> CommandRegistry<AssistantService> {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(assistant::GreetingHandler));
    registry.register(Arc::new(assistant::LookupHandler));
    registry.register(Arc::new(assistant::NoteHandler));
    registry
}

/// Registry with every reminders bot command
pub fn reminders_registry() -> CommandRegistry<ReminderService> {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(reminders::SubscriptionHandler));
    registry.register(Arc::new(reminders::RefreshHandler));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_commands_registered() {
        let assistant = assistant_registry();
        for name in ["start", "help", "residents", "tasks", "activities", "note"] {
            assert!(assistant.contains(name), "missing /{name}");
        }
        let reminders = reminders_registry();
        for name in ["start", "stop", "refresh"] {
            assert!(reminders.contains(name), "missing /{name}");
        }
    }
}
