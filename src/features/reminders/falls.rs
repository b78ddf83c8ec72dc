//! Fall alerts from the detection logs, broadcast to every registered chat

use chrono::{DateTime, Duration, FixedOffset, Utc};
use log::{error, info, warn};

use super::scheduler::ReminderService;
use super::window::ReminderKind;
use crate::core::time::{format_local, parse_api_timestamp};
use crate::platform::{FallLog, FallStatus};

/// Markdown alert card; only pending and confirmed falls have one
pub fn fall_message(log: &FallLog, at: DateTime<Utc>, offset: FixedOffset) -> Option<String> {
    let (heading, status) = match log.status {
        FallStatus::Pending => ("⚠️ *Fall Detected*", "*Pending Review*"),
        FallStatus::Confirmed => ("✅ *Fall Confirmed*", "*Confirmed Fall*"),
        FallStatus::Other(_) => return None,
    };
    Some(format!(
        "{heading}\nResident: `{}`\nTime: `{}`\nAcceleration: `{}`\nStatus: {status}",
        log.resident_id.as_deref().unwrap_or("Unknown"),
        format_local(at, offset),
        log.acceleration_magnitude,
    ))
}

impl ReminderService {
    /// One fall pass over the recent logs; returns alerts sent
    pub async fn process_falls(&self, now: DateTime<Utc>) -> usize {
        let chat_ids = self.chats.chat_ids();
        if chat_ids.is_empty() {
            return 0;
        }

        let since = now - Duration::minutes(self.schedule.fall_lookback_minutes);
        let logs = match self.platform.fetch_fall_logs(since).await {
            Ok(logs) => logs,
            Err(e) => {
                error!("Error fetching fall logs: {e}");
                Vec::new()
            }
        };

        let mut sent_count = 0;
        for log in &logs {
            let Some(id) = log.id.as_deref() else {
                warn!("Skipping fall log without an id");
                continue;
            };
            if log.alert_sent {
                continue;
            }
            let at = match log.timestamp.as_deref().map(parse_api_timestamp) {
                Some(Ok(at)) => at,
                Some(Err(e)) => {
                    error!("Error processing fall log {id}: {e}");
                    continue;
                }
                None => {
                    error!("Error processing fall log {id}: missing timestamp");
                    continue;
                }
            };
            if self.ledger.contains(ReminderKind::Fall, id, at) {
                continue;
            }
            let Some(message) = fall_message(log, at, self.offset) else {
                continue;
            };

            let mut delivered = 0;
            for chat_id in &chat_ids {
                match self.notifier.send(*chat_id, &message, true).await {
                    Ok(()) => delivered += 1,
                    Err(e) => error!("Error sending fall alert to chat {chat_id}: {e}"),
                }
            }
            if delivered == 0 {
                continue;
            }

            sent_count += 1;
            self.ledger.record(ReminderKind::Fall, id, at, now);
            if let Err(e) = self.platform.mark_fall_alert_sent(id).await {
                warn!("Failed to mark fall log {id} as alerted: {e}");
            }
        }

        if sent_count > 0 {
            info!("⚠️ Sent {sent_count} fall alert(s)");
        }
        sent_count
    }
}
