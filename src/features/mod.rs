//! # Features
//!
//! Assistant-side features (auth, query parsing, response formatting,
//! voice notes) and the reminders engine.

pub mod assistant;
pub mod audio;
pub mod auth;
pub mod query;
pub mod reminders;
pub mod responses;

pub use assistant::AssistantService;
pub use audio::{AudioTranscriber, NoteSummarizer, TranscriptionResult};
pub use auth::Authorizer;
pub use query::{Intent, ParsedQuery, QueryParser};
pub use reminders::{ReminderSchedule, ReminderService};
pub use responses::ResponseFormatter;
