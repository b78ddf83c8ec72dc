//! When a reminder is due, and which ones already went out

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

/// Due when `now` lies in `[start - lead, start)` and nothing was sent yet
pub fn is_due(now: DateTime<Utc>, start: DateTime<Utc>, lead_minutes: i64, already_sent: bool) -> bool {
    if already_sent {
        return false;
    }
    let remind_at = Duration::try_minutes(lead_minutes.max(0))
        .and_then(|lead| start.checked_sub_signed(lead))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    now >= remind_at && now < start
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    Activity,
    Task,
    Fall,
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderKind::Activity => write!(f, "activity"),
            ReminderKind::Task => write!(f, "task"),
            ReminderKind::Fall => write!(f, "fall"),
        }
    }
}

type LedgerKey = (ReminderKind, String, DateTime<Utc>);

/// Reminders delivered by this process, keyed by (kind, record id, start).
///
/// Covers the gap between delivery and the API's sent flag catching up, and
/// failed flag updates. A record whose start time moves gets a new key.
#[derive(Clone, Default)]
pub struct SentLedger {
    entries: Arc<DashMap<LedgerKey, DateTime<Utc>>>,
}

impl SentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: ReminderKind, id: &str, start: DateTime<Utc>) -> bool {
        self.entries.contains_key(&(kind, id.to_string(), start))
    }

    pub fn record(&self, kind: ReminderKind, id: &str, start: DateTime<Utc>, sent_at: DateTime<Utc>) {
        self.entries.insert((kind, id.to_string(), start), sent_at);
    }

    /// Drop entries sent more than a day before `now`
    pub fn prune(&self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(1);
        let before = self.entries.len();
        self.entries.retain(|_, sent_at| *sent_at >= cutoff);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Pruned {removed} sent reminder entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
