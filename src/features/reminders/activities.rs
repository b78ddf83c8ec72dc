//! Activity reminders, broadcast to every registered chat

use chrono::{DateTime, FixedOffset, Utc};
use log::{debug, error, info, warn};

use super::scheduler::ReminderService;
use super::window::{is_due, ReminderKind};
use crate::core::time::{format_local, parse_api_timestamp};
use crate::platform::ApiActivity;

pub fn activity_message(activity: &ApiActivity, start: DateTime<Utc>, offset: FixedOffset) -> String {
    let title = if activity.title.is_empty() {
        "Unnamed activity"
    } else {
        activity.title.as_str()
    };
    let location = activity
        .location
        .as_deref()
        .map(|l| format!(" at {l}"))
        .unwrap_or_default();

    let mut message = format!(
        "📅 REMINDER: {title} starts at {}{location}",
        format_local(start, offset)
    );
    if let Some(description) = activity.description.as_deref() {
        message.push_str(&format!("\n\n{description}"));
    }
    message
}

impl ReminderService {
    /// One activity pass; returns how many reminders went out
    pub async fn process_activities(&self, now: DateTime<Utc>) -> usize {
        let chat_ids = self.chats.chat_ids();
        if chat_ids.is_empty() {
            debug!("No registered chats, skipping activity pass");
            return 0;
        }

        let activities = match self.platform.fetch_activities(now).await {
            Ok(activities) => activities,
            Err(e) => {
                error!("Error fetching activities: {e}");
                Vec::new()
            }
        };
        let horizon = self.lookahead_end(now);
        let mut sent_count = 0;

        for activity in &activities {
            let Some(raw_start) = activity.start_time.as_deref() else {
                error!("Activity {} has no start time, skipping", activity.id);
                continue;
            };
            let start = match parse_api_timestamp(raw_start) {
                Ok(start) => start,
                Err(e) => {
                    error!("Error processing activity {}: {e}", activity.id);
                    continue;
                }
            };
            if start > horizon {
                continue;
            }

            let lead = activity
                .reminder_minutes
                .unwrap_or(self.schedule.default_lead_minutes);
            let already_sent = activity.reminder_sent
                || self.ledger.contains(ReminderKind::Activity, &activity.id, start);
            if !is_due(now, start, lead, already_sent) {
                continue;
            }

            info!("Sending reminder for activity {}: {}", activity.id, activity.title);
            let message = activity_message(activity, start, self.offset);
            let mut delivered = 0;
            for chat_id in &chat_ids {
                match self.notifier.send(*chat_id, &message, false).await {
                    Ok(()) => delivered += 1,
                    Err(e) => error!("Error sending activity reminder to chat {chat_id}: {e}"),
                }
            }
            if delivered == 0 {
                continue;
            }

            sent_count += 1;
            self.ledger
                .record(ReminderKind::Activity, &activity.id, start, now);
            if let Err(e) = self.platform.mark_activity_reminder_sent(&activity.id).await {
                warn!("Failed to mark reminder sent for activity {}: {e}", activity.id);
            }
        }

        info!(
            "Processed {} activities, sent {sent_count} reminders",
            activities.len()
        );
        sent_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::notifier::testing::RecordingNotifier;
    use crate::features::reminders::test_service;
    use crate::platform::testing::StubPlatform;
    use std::sync::Arc;

    fn activity(id: &str, start: &str) -> ApiActivity {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": "Bingo",
            "location": "Main Hall",
            "description": "Bring your cards",
            "start_time": start,
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        parse_api_timestamp("2026-10-19T06:57:00Z").unwrap()
    }

    #[test]
    fn test_message_in_facility_time() {
        let a = activity("a1", "2026-10-19T07:00:00Z");
        let start = parse_api_timestamp(a.start_time.as_deref().unwrap()).unwrap();
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(
            activity_message(&a, start, offset),
            "📅 REMINDER: Bingo starts at 2026-10-19 15:00 at Main Hall\n\nBring your cards"
        );
    }

    #[tokio::test]
    async fn test_due_activity_broadcast_once() {
        let platform = Arc::new(StubPlatform {
            activities: vec![
                activity("a1", "2026-10-19T07:00:00Z"),
                // Outside the five-minute window
                activity("a2", "2026-10-19T08:00:00Z"),
            ],
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let service = test_service(platform.clone(), notifier.clone());
        service.chats.register("u1", 100, "Nora");
        service.chats.register("u2", 200, "Sam");

        assert_eq!(service.process_activities(now()).await, 1);
        let mut chats: Vec<i64> = notifier.messages().iter().map(|m| m.0).collect();
        chats.sort();
        assert_eq!(chats, vec![100, 200]);
        assert_eq!(platform.marked(), vec!["activity:a1"]);

        // The stub still reports reminder_sent = false; the ledger stops a repeat
        assert_eq!(service.process_activities(now()).await, 0);
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_flagged_activity_is_skipped() {
        let mut sent = activity("a1", "2026-10-19T07:00:00Z");
        sent.reminder_sent = true;
        let platform = Arc::new(StubPlatform {
            activities: vec![sent],
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let service = test_service(platform, notifier.clone());
        service.chats.register("u1", 100, "Nora");

        assert_eq!(service.process_activities(now()).await, 0);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_undelivered_activity_is_not_marked() {
        let platform = Arc::new(StubPlatform {
            activities: vec![activity("a1", "2026-10-19T07:00:00Z")],
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::failing_for(vec![100]));
        let service = test_service(platform.clone(), notifier);
        service.chats.register("u1", 100, "Nora");

        assert_eq!(service.process_activities(now()).await, 0);
        assert!(platform.marked().is_empty());
    }

    #[tokio::test]
    async fn test_bad_timestamp_and_offline_api() {
        let platform = Arc::new(StubPlatform {
            activities: vec![activity("bad", "soon"), activity("a1", "2026-10-19T07:00:00Z")],
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let service = test_service(platform, notifier);
        service.chats.register("u1", 100, "Nora");
        assert_eq!(service.process_activities(now()).await, 1);

        let offline = Arc::new(StubPlatform {
            offline: true,
            ..Default::default()
        });
        let service = test_service(offline, Arc::new(RecordingNotifier::default()));
        service.chats.register("u1", 100, "Nora");
        assert_eq!(service.process_activities(now()).await, 0);
    }

    #[tokio::test]
    async fn test_activity_without_start_is_skipped_alone() {
        let mut undated = activity("a0", "2026-10-19T07:00:00Z");
        undated.start_time = None;
        let platform = Arc::new(StubPlatform {
            activities: vec![undated, activity("a1", "2026-10-19T07:00:00Z")],
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let service = test_service(platform.clone(), notifier.clone());
        service.chats.register("u1", 100, "Nora");

        assert_eq!(service.process_activities(now()).await, 1);
        assert_eq!(platform.marked(), vec!["activity:a1"]);
    }
}
