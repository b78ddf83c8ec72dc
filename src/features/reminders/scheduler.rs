//! # Reminder Scheduler
//!
//! Owns the reminder state and drives one background loop per poller:
//! activities, tasks, falls, the medication job tick and the daily
//! medication pass.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Platform API polling with time-window gating, per-user chats
//! - 1.0.0: Initial release

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::medications::MedicationQueue;
use super::notifier::Notifier;
use super::registry::ChatRegistry;
use super::schedule::ReminderSchedule;
use super::window::SentLedger;
use crate::core::time::local_now;
use crate::platform::CarePlatform;

pub struct ReminderService {
    pub(super) platform: Arc<dyn CarePlatform>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) chats: ChatRegistry,
    pub(super) ledger: SentLedger,
    pub(super) medications: MedicationQueue,
    pub(super) schedule: ReminderSchedule,
    pub(super) offset: FixedOffset,
}

impl ReminderService {
    pub fn new(
        platform: Arc<dyn CarePlatform>,
        notifier: Arc<dyn Notifier>,
        schedule: ReminderSchedule,
        offset: FixedOffset,
    ) -> Self {
        ReminderService {
            platform,
            notifier,
            chats: ChatRegistry::new(),
            ledger: SentLedger::new(),
            medications: MedicationQueue::new(),
            schedule,
            offset,
        }
    }

    pub fn chats(&self) -> &ChatRegistry {
        &self.chats
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn pending_medications(&self) -> usize {
        self.medications.len()
    }

    /// Current facility wall-clock time
    pub fn local_now(&self) -> NaiveDateTime {
        local_now(self.offset)
    }

    /// One activity and one task pass, as run at startup and on refresh
    pub async fn run_polling_passes(&self) {
        let now = Utc::now();
        self.process_activities(now).await;
        self.process_tasks(now).await;
    }

    /// Spawn every background loop. The handles run until aborted.
    pub fn spawn_loops(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let service = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.schedule.activity_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                "📅 Activity reminder loop started (interval: {}s)",
                service.schedule.activity_interval_secs
            );
            loop {
                interval.tick().await;
                service.process_activities(Utc::now()).await;
            }
        }));

        let service = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.schedule.task_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                "📋 Task reminder loop started (interval: {}s)",
                service.schedule.task_interval_secs
            );
            loop {
                interval.tick().await;
                service.process_tasks(Utc::now()).await;
            }
        }));

        let service = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.schedule.fall_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                "⚠️ Fall alert loop started (interval: {}s)",
                service.schedule.fall_interval_secs
            );
            loop {
                interval.tick().await;
                service.process_falls(Utc::now()).await;
            }
        }));

        let service = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.schedule.medication_tick());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                "💊 Medication dispatch loop started (interval: {}s)",
                service.schedule.medication_tick_secs
            );
            loop {
                interval.tick().await;
                service.dispatch_due_medications(service.local_now()).await;
                service.ledger.prune(Utc::now());
            }
        }));

        let service = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            service.daily_medication_loop().await;
        }));

        handles
    }

    async fn daily_medication_loop(&self) {
        let daily_time = match self.schedule.daily_time() {
            Ok(time) => time,
            Err(e) => {
                error!("Daily medication pass disabled: {e}");
                return;
            }
        };
        info!("🗓️ Daily medication pass scheduled at {daily_time} facility time");

        loop {
            let now = self.local_now();
            let next = next_daily_run(now, daily_time);
            let wait = (next - now).to_std().unwrap_or_default();
            debug!("Next medication pass at {next} (in {wait:?})");
            tokio::time::sleep(wait).await;

            info!("Running daily medication pass");
            let queued = self.schedule_all_medications(self.local_now()).await;
            info!("Daily medication pass queued {queued} reminders");
        }
    }

    /// Activities and tasks further out than the lookahead are ignored
    pub(super) fn lookahead_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.schedule.lookahead_days)
    }
}

/// The next facility-local moment at `time`, strictly after `now`
pub fn next_daily_run(now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(time);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
