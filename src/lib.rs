// Core layer - shared types and configuration
pub mod core;

// Features layer - all feature modules
pub mod features;

// External care platform REST API
pub mod platform;

// Transport-neutral replies and buttons
pub mod message_components;

// Infrastructure
pub mod database;

// Application layer
pub mod commands;
pub mod telegram;

// Re-export core config for convenience
pub use core::Config;

// Re-export feature items
pub use features::{
    // Assistant
    AssistantService,
    // Audio
    AudioTranscriber, NoteSummarizer, TranscriptionResult,
    // Auth
    Authorizer,
    // Query parsing
    Intent, ParsedQuery, QueryParser,
    // Reminders
    ReminderSchedule, ReminderService,
    // Responses
    ResponseFormatter,
};
