//! # Reminders Feature
//!
//! Polls the care platform API and pushes activity, task, medication and
//! fall reminders to the chats of registered staff users. Each record fires
//! once: a time window gates delivery and the API's sent flag plus an
//! in-memory ledger stop repeats.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Platform API pollers, medication queue, fall alerts
//! - 1.0.0: Initial release

pub mod activities;
pub mod falls;
pub mod medications;
pub mod notifier;
pub mod registry;
pub mod schedule;
pub mod scheduler;
pub mod tasks;
pub mod window;

pub use medications::{MedicationJob, MedicationQueue};
pub use notifier::Notifier;
pub use registry::{ChatRegistry, RegisteredChat};
pub use schedule::ReminderSchedule;
pub use scheduler::ReminderService;
pub use window::{is_due, ReminderKind, SentLedger};

#[cfg(test)]
pub(crate) fn test_service(
    platform: std::sync::Arc<dyn crate::platform::CarePlatform>,
    notifier: std::sync::Arc<dyn Notifier>,
) -> ReminderService {
    let offset = chrono::FixedOffset::east_opt(8 * 3600).expect("valid offset");
    ReminderService::new(platform, notifier, ReminderSchedule::default(), offset)
}
