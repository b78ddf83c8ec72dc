//! # Medication Reminders
//!
//! Once a day (and whenever a caregiver runs `/start` or `/refresh`) the
//! residents in each caregiver's care are walked, today's doses are worked
//! out from each medication's schedule, and one job per dose is queued.
//! A short tick then sends whatever has come due.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

use super::registry::RegisteredChat;
use super::scheduler::ReminderService;
use crate::platform::{ApiMedication, ApiResident, ScheduleType, TimeOfDay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationJob {
    pub staff_id: String,
    pub chat_id: i64,
    /// Facility-local send time
    pub due: NaiveDateTime,
    pub message: String,
}

/// Pending medication jobs keyed by job id
#[derive(Clone, Default)]
pub struct MedicationQueue {
    jobs: Arc<DashMap<Uuid, MedicationJob>>,
}

impl MedicationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn insert(&self, job: MedicationJob) -> Uuid {
        let id = Uuid::new_v4();
        self.jobs.insert(id, job);
        id
    }

    /// Drop every pending job for a staff user; returns how many went
    pub fn clear_user(&self, staff_id: &str) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, job| job.staff_id != staff_id);
        before.saturating_sub(self.jobs.len())
    }

    /// Remove and return the jobs due at or before `now`, earliest first
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<MedicationJob> {
        let due_ids: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().due <= now)
            .map(|entry| *entry.key())
            .collect();

        let mut due: Vec<MedicationJob> = due_ids
            .into_iter()
            .filter_map(|id| self.jobs.remove(&id).map(|(_, job)| job))
            .collect();
        due.sort_by_key(|job| job.due);
        due
    }
}

/// The `YYYY-MM-DD` part of an API date
fn parse_date_part(raw: &str) -> Result<NaiveDate> {
    let date = raw.trim().get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| anyhow!("Invalid medication date '{}': {}", raw, e))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Whether a medication has doses on `today`.
///
/// Active from the start date up to but excluding the end date. `day`
/// schedules repeat every N days from the start, `week` schedules every N
/// calendar weeks on the listed weekdays. Custom schedules are not reminded.
pub fn scheduled_on(med: &ApiMedication, today: NaiveDate) -> Result<bool> {
    let start = parse_date_part(&med.start_date)?;
    let end = parse_date_part(&med.end_date)?;
    if today < start || today >= end {
        return Ok(false);
    }

    let repeat = med.repeat.filter(|r| *r > 0).unwrap_or(1);
    let scheduled = match med.schedule_type {
        ScheduleType::Day => (today - start).num_days() % repeat == 0,
        ScheduleType::Week => {
            let weeks = (week_start(today) - week_start(start)).num_days() / 7;
            let weekday = today.format("%a").to_string();
            weeks % repeat == 0
                && med
                    .days_of_week
                    .iter()
                    .any(|day| day.trim().eq_ignore_ascii_case(&weekday))
        }
        ScheduleType::Custom | ScheduleType::Unknown => false,
    };
    Ok(scheduled)
}

pub fn medication_message(resident: &ApiResident, med: &ApiMedication, time: TimeOfDay) -> String {
    let icon = match resident.gender.as_deref() {
        Some(gender) if gender.eq_ignore_ascii_case("male") => "👴",
        _ => "👵",
    };
    let dosage = med.dosage.as_deref().unwrap_or("Not specified");

    let mut message = format!(
        "🔔 [{:02}:{:02}] {} for {}\n\n\
         Please administer the following medication:\n\n\
         {icon} Resident: {}\n\
         💊 Medication: {}\n\
         🩺 Dosage: {dosage}",
        time.hour, time.minute, med.medication_name, resident.full_name, resident.full_name,
        med.medication_name,
    );
    if let Some(instructions) = med.instructions.as_deref() {
        message.push_str(&format!("\n📝 Instructions: {instructions}"));
    }
    message
}

impl ReminderService {
    /// Replace a staff user's pending jobs with today's remaining doses
    pub async fn queue_medications_for(
        &self,
        staff_id: &str,
        chat: &RegisteredChat,
        now: NaiveDateTime,
    ) -> usize {
        let cleared = self.medications.clear_user(staff_id);
        if cleared > 0 {
            debug!("Cleared {cleared} pending medication jobs for {staff_id}");
        }

        let residents = match self.platform.fetch_residents(&chat.name).await {
            Ok(residents) => residents,
            Err(e) => {
                error!("Error fetching residents for {}: {e}", chat.name);
                return 0;
            }
        };

        let today = now.date();
        let mut queued = 0;
        for resident in &residents {
            let medications = match self.platform.fetch_medications(&resident.id).await {
                Ok(medications) => medications,
                Err(e) => {
                    error!("Error processing medications for resident {}: {e}", resident.full_name);
                    continue;
                }
            };

            for med in &medications {
                match scheduled_on(med, today) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        error!("Skipping {} for {}: {e}", med.medication_name, resident.full_name);
                        continue;
                    }
                }

                for time in &med.times_of_day {
                    let Some(due) = today.and_hms_opt(time.hour, time.minute, 0) else {
                        error!(
                            "Invalid dose time {}:{} for {}",
                            time.hour, time.minute, med.medication_name
                        );
                        continue;
                    };
                    if due < now {
                        continue;
                    }

                    debug!(
                        "Queuing medication reminder for {}-{} to user {staff_id}",
                        resident.full_name, med.medication_name
                    );
                    self.medications.insert(MedicationJob {
                        staff_id: staff_id.to_string(),
                        chat_id: chat.chat_id,
                        due,
                        message: medication_message(resident, med, *time),
                    });
                    queued += 1;
                }
            }
        }

        info!("💊 Queued {queued} medication reminders for {}", chat.name);
        queued
    }

    /// Re-queue today's doses for every registered user
    pub async fn schedule_all_medications(&self, now: NaiveDateTime) -> usize {
        let mut total = 0;
        for (staff_id, chat) in self.chats.snapshot() {
            total += self.queue_medications_for(&staff_id, &chat, now).await;
        }
        total
    }

    /// Send and drop every job that has come due
    pub async fn dispatch_due_medications(&self, now: NaiveDateTime) -> usize {
        let mut sent = 0;
        for job in self.medications.take_due(now) {
            match self.notifier.send(job.chat_id, &job.message, false).await {
                Ok(()) => sent += 1,
                Err(e) => error!("Error sending medication reminder to chat {}: {e}", job.chat_id),
            }
        }
        if sent > 0 {
            info!("Sent {sent} medication reminders");
        }
        sent
    }

    pub fn clear_medications(&self, staff_id: &str) -> usize {
        self.medications.clear_user(staff_id)
    }
}
