//! # Care Platform API
//!
//! The external REST API the reminders bot polls. [`CarePlatform`] is the
//! seam the pollers depend on; [`HttpPlatform`] is the reqwest implementation.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod client;
pub mod models;

pub use client::HttpPlatform;
pub use models::{
    ApiActivity, ApiMedication, ApiResident, ApiTask, FallLog, FallStatus, ScheduleType, TimeOfDay,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait CarePlatform: Send + Sync {
    /// Activities starting at or after `since`, earliest first
    async fn fetch_activities(&self, since: DateTime<Utc>) -> Result<Vec<ApiActivity>>;

    async fn mark_activity_reminder_sent(&self, activity_id: &str) -> Result<()>;

    /// Tasks assigned to a staff user with start dates in `[start, end]`
    async fn fetch_tasks(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        assigned_to: &str,
    ) -> Result<Vec<ApiTask>>;

    async fn mark_task_reminder_sent(&self, task_id: &str) -> Result<()>;

    /// Residents in a caregiver's care
    async fn fetch_residents(&self, caregiver_name: &str) -> Result<Vec<ApiResident>>;

    async fn fetch_medications(&self, resident_id: &str) -> Result<Vec<ApiMedication>>;

    /// Fall events logged after `start_after`
    async fn fetch_fall_logs(&self, start_after: DateTime<Utc>) -> Result<Vec<FallLog>>;

    async fn mark_fall_alert_sent(&self, log_id: &str) -> Result<()>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned API responses; every PATCH is recorded as `"<kind>:<id>"`
    #[derive(Default)]
    pub struct StubPlatform {
        pub activities: Vec<ApiActivity>,
        /// Keyed by assigned staff id
        pub tasks: HashMap<String, Vec<ApiTask>>,
        /// Keyed by caregiver name
        pub residents: HashMap<String, Vec<ApiResident>>,
        /// Keyed by resident id
        pub medications: HashMap<String, Vec<ApiMedication>>,
        pub falls: Vec<FallLog>,
        /// Every fetch fails when set
        pub offline: bool,
        pub marked: Mutex<Vec<String>>,
    }

    impl StubPlatform {
        pub fn marked(&self) -> Vec<String> {
            self.marked.lock().unwrap().clone()
        }

        fn online(&self) -> Result<()> {
            if self.offline {
                Err(anyhow::anyhow!("platform offline"))
            } else {
                Ok(())
            }
        }

        fn mark(&self, kind: &str, id: &str) -> Result<()> {
            self.online()?;
            self.marked.lock().unwrap().push(format!("{kind}:{id}"));
            Ok(())
        }
    }

    #[async_trait]
    impl CarePlatform for StubPlatform {
        async fn fetch_activities(&self, _since: DateTime<Utc>) -> Result<Vec<ApiActivity>> {
            self.online()?;
            Ok(self.activities.clone())
        }

        async fn mark_activity_reminder_sent(&self, activity_id: &str) -> Result<()> {
            self.mark("activity", activity_id)
        }

        async fn fetch_tasks(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
            assigned_to: &str,
        ) -> Result<Vec<ApiTask>> {
            self.online()?;
            Ok(self.tasks.get(assigned_to).cloned().unwrap_or_default())
        }

        async fn mark_task_reminder_sent(&self, task_id: &str) -> Result<()> {
            self.mark("task", task_id)
        }

        async fn fetch_residents(&self, caregiver_name: &str) -> Result<Vec<ApiResident>> {
            self.online()?;
            Ok(self.residents.get(caregiver_name).cloned().unwrap_or_default())
        }

        async fn fetch_medications(&self, resident_id: &str) -> Result<Vec<ApiMedication>> {
            self.online()?;
            Ok(self.medications.get(resident_id).cloned().unwrap_or_default())
        }

        async fn fetch_fall_logs(&self, _start_after: DateTime<Utc>) -> Result<Vec<FallLog>> {
            self.online()?;
            Ok(self.falls.clone())
        }

        async fn mark_fall_alert_sent(&self, log_id: &str) -> Result<()> {
            self.mark("fall", log_id)
        }
    }
}
