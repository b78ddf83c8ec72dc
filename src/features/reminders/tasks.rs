//! Task reminders, sent to the chat of the staff user the task is assigned to

use chrono::{DateTime, Duration, FixedOffset, Utc};
use log::{error, info, warn};

use super::scheduler::ReminderService;
use super::window::{is_due, ReminderKind};
use crate::core::time::{format_local, parse_api_timestamp};
use crate::platform::ApiTask;

pub fn task_message(task: &ApiTask, start: DateTime<Utc>, offset: FixedOffset) -> String {
    let priority = task
        .priority
        .as_deref()
        .map(|p| format!(" [{p}]"))
        .unwrap_or_default();

    let start_text = format_local(start, offset);
    let when = match task.due_date.as_deref().map(parse_api_timestamp) {
        Some(Ok(due)) => format!("from {start_text} to {}", format_local(due, offset)),
        _ => format!("at {start_text}"),
    };

    let mut message = format!("📋 TASK REMINDER{priority}: {} {when}", task.task_title);
    if let Some(resident) = task.resident_name.as_deref() {
        message.push_str(&format!(" for {resident}"));
    }
    if let Some(room) = task.resident_room.as_deref() {
        message.push_str(&format!(" (Room: {room})"));
    }
    if let Some(details) = task.task_details.as_deref() {
        message.push_str(&format!("\n\n{details}"));
    }
    message
}

impl ReminderService {
    /// One task pass over every registered user; returns reminders sent
    pub async fn process_tasks(&self, now: DateTime<Utc>) -> usize {
        let today = now.date_naive();
        let until = today + Duration::days(self.schedule.lookahead_days);
        let horizon = self.lookahead_end(now);
        let mut sent_count = 0;

        for (staff_id, chat) in self.chats.snapshot() {
            let tasks = match self.platform.fetch_tasks(today, until, &staff_id).await {
                Ok(tasks) => tasks,
                Err(e) => {
                    error!("Error fetching tasks for {staff_id}: {e}");
                    continue;
                }
            };

            for task in &tasks {
                let Some(raw_start) = task.start_date.as_deref() else {
                    error!("Task {} has no start date, skipping", task.id);
                    continue;
                };
                let start = match parse_api_timestamp(raw_start) {
                    Ok(start) => start,
                    Err(e) => {
                        error!("Error processing task {}: {e}", task.id);
                        continue;
                    }
                };
                if start > horizon {
                    continue;
                }

                let lead = task.remind_prior.unwrap_or(self.schedule.default_lead_minutes);
                let already_sent =
                    task.reminder_sent || self.ledger.contains(ReminderKind::Task, &task.id, start);
                if !is_due(now, start, lead, already_sent) {
                    continue;
                }

                let message = task_message(task, start, self.offset);
                if let Err(e) = self.notifier.send(chat.chat_id, &message, false).await {
                    error!("Error sending task reminder {} to {}: {e}", task.id, chat.name);
                    continue;
                }

                info!("Sent reminder for task {} to {}", task.id, chat.name);
                sent_count += 1;
                self.ledger.record(ReminderKind::Task, &task.id, start, now);
                if let Err(e) = self.platform.mark_task_reminder_sent(&task.id).await {
                    warn!("Failed to mark reminder sent for task {}: {e}", task.id);
                }
            }
        }

        sent_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::notifier::testing::RecordingNotifier;
    use crate::features::reminders::test_service;
    use crate::platform::testing::StubPlatform;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn task(id: &str, value: serde_json::Value) -> ApiTask {
        let mut json = serde_json::json!({
            "id": id,
            "task_title": "Assist with bath",
            "start_date": "2026-10-19T07:00:00Z",
        });
        if let (Some(base), Some(extra)) = (json.as_object_mut(), value.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(json).unwrap()
    }

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_message_with_every_field() {
        let t = task(
            "t1",
            serde_json::json!({
                "priority": "High",
                "due_date": "2026-10-19T07:30:00Z",
                "resident_name": "Mary Tan",
                "resident_room": 101,
                "task_details": "Use the shower chair",
            }),
        );
        let start = parse_api_timestamp(t.start_date.as_deref().unwrap()).unwrap();
        assert_eq!(
            task_message(&t, start, offset()),
            "📋 TASK REMINDER [High]: Assist with bath from 2026-10-19 15:00 to 2026-10-19 15:30 \
             for Mary Tan (Room: 101)\n\nUse the shower chair"
        );
    }

    #[test]
    fn test_message_minimal() {
        let t = task("t1", serde_json::json!({}));
        let start = parse_api_timestamp(t.start_date.as_deref().unwrap()).unwrap();
        assert_eq!(
            task_message(&t, start, offset()),
            "📋 TASK REMINDER: Assist with bath at 2026-10-19 15:00"
        );
    }

    #[tokio::test]
    async fn test_tasks_go_to_the_assignee_only() {
        let mut tasks = HashMap::new();
        tasks.insert(
            "u1".to_string(),
            vec![
                task("t1", serde_json::json!({"remind_prior": 15})),
                task("t2", serde_json::json!({"reminder_sent": true})),
            ],
        );
        let platform = Arc::new(StubPlatform {
            tasks,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let service = test_service(platform.clone(), notifier.clone());
        service.chats.register("u1", 100, "Nora");
        service.chats.register("u2", 200, "Sam");

        // 10 minutes ahead: inside t1's 15 minute lead
        let now = parse_api_timestamp("2026-10-19T06:50:00Z").unwrap();
        assert_eq!(service.process_tasks(now).await, 1);
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, 100);
        assert_eq!(platform.marked(), vec!["task:t1"]);

        assert_eq!(service.process_tasks(now).await, 0);
    }

    #[tokio::test]
    async fn test_default_lead_applies() {
        let mut tasks = HashMap::new();
        tasks.insert("u1".to_string(), vec![task("t1", serde_json::json!({}))]);
        let platform = Arc::new(StubPlatform {
            tasks,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let service = test_service(platform, notifier);
        service.chats.register("u1", 100, "Nora");

        let early = parse_api_timestamp("2026-10-19T06:50:00Z").unwrap();
        assert_eq!(service.process_tasks(early).await, 0);
        let due = parse_api_timestamp("2026-10-19T06:56:00Z").unwrap();
        assert_eq!(service.process_tasks(due).await, 1);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_task_unmarked() {
        let mut tasks = HashMap::new();
        tasks.insert("u1".to_string(), vec![task("t1", serde_json::json!({}))]);
        let platform = Arc::new(StubPlatform {
            tasks,
            ..Default::default()
        });
        let service = test_service(platform.clone(), Arc::new(RecordingNotifier::failing_for(vec![100])));
        service.chats.register("u1", 100, "Nora");

        let now = parse_api_timestamp("2026-10-19T06:57:00Z").unwrap();
        assert_eq!(service.process_tasks(now).await, 0);
        assert!(platform.marked().is_empty());
    }

    #[tokio::test]
    async fn test_task_without_start_date_is_skipped_alone() {
        let mut tasks = HashMap::new();
        tasks.insert(
            "u1".to_string(),
            vec![
                task("t0", serde_json::json!({"start_date": null})),
                task("t1", serde_json::json!({})),
            ],
        );
        let platform = Arc::new(StubPlatform {
            tasks,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let service = test_service(platform.clone(), notifier.clone());
        service.chats.register("u1", 100, "Nora");

        let now = parse_api_timestamp("2026-10-19T06:57:00Z").unwrap();
        assert_eq!(service.process_tasks(now).await, 1);
        assert_eq!(platform.marked(), vec!["task:t1"]);
    }
}
