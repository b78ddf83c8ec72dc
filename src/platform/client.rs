//! reqwest client for the care platform API

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, error, info};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::models::decode_records;
use super::{ApiActivity, ApiMedication, ApiResident, ApiTask, CarePlatform, FallLog};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct HttpPlatform {
    base_url: String,
    http: Client,
}

impl HttpPlatform {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(HttpPlatform {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Fail on non-2xx after logging the status and body
    async fn check(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("API returned status {status} for {what}");
        error!("Response body: {body}");
        Err(anyhow!("{what} failed with status {status}"))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let url = self.endpoint(path);
        debug!("GET {url} {query:?}");
        let response = self.http.get(&url).query(query).send().await?;
        let response = Self::check(response, what).await?;
        Ok(response.json::<T>().await?)
    }

    /// List endpoints: a malformed record is skipped, not the whole response
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<Vec<T>> {
        let values = self.get_json::<Vec<serde_json::Value>>(path, query, what).await?;
        Ok(decode_records(values, what))
    }

    async fn patch(&self, path: &str, what: &str) -> Result<()> {
        let url = self.endpoint(path);
        debug!("PATCH {url}");
        let response = self.http.patch(&url).send().await?;
        Self::check(response, what).await?;
        Ok(())
    }
}

#[async_trait]
impl CarePlatform for HttpPlatform {
    async fn fetch_activities(&self, since: DateTime<Utc>) -> Result<Vec<ApiActivity>> {
        let start_date = since.format("%Y-%m-%dT%H:%M:%S").to_string();
        info!("Fetching activities starting after {start_date}");
        self.get_list(
            "activities",
            &[
                ("start_date", start_date),
                ("sort_by", "start_time".to_string()),
                ("sort_order", "asc".to_string()),
            ],
            "activity fetch",
        )
        .await
    }

    async fn mark_activity_reminder_sent(&self, activity_id: &str) -> Result<()> {
        self.patch(
            &format!("activities/{activity_id}/mark_reminder_sent"),
            "activity reminder update",
        )
        .await?;
        info!("Marked activity {activity_id} as reminder_sent");
        Ok(())
    }

    async fn fetch_tasks(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        assigned_to: &str,
    ) -> Result<Vec<ApiTask>> {
        info!("Fetching tasks from {start} to {end} for user {assigned_to}");
        self.get_list(
            "tasks/telegram",
            &[
                ("start_date", start.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
                ("assigned_to", assigned_to.to_string()),
            ],
            "task fetch",
        )
        .await
    }

    async fn mark_task_reminder_sent(&self, task_id: &str) -> Result<()> {
        self.patch(
            &format!("tasks/{task_id}/mark_reminder_sent"),
            "task reminder update",
        )
        .await?;
        info!("Marked task {task_id} as reminder_sent");
        Ok(())
    }

    async fn fetch_residents(&self, caregiver_name: &str) -> Result<Vec<ApiResident>> {
        info!("Fetching residents for {caregiver_name}");
        self.get_list(
            "residents/getAllResidents",
            &[("caregiver_name", caregiver_name.to_string())],
            "resident fetch",
        )
        .await
    }

    async fn fetch_medications(&self, resident_id: &str) -> Result<Vec<ApiMedication>> {
        debug!("Fetching medications for resident {resident_id}");
        self.get_list(
            &format!("residents/{resident_id}/medications"),
            &[],
            "medication fetch",
        )
        .await
    }

    async fn fetch_fall_logs(&self, start_after: DateTime<Utc>) -> Result<Vec<FallLog>> {
        let start_after = start_after.to_rfc3339();
        debug!("Fetching fall logs after {start_after}");
        self.get_list(
            "fall-detection/logs",
            &[("start_after", start_after)],
            "fall log fetch",
        )
        .await
    }

    async fn mark_fall_alert_sent(&self, log_id: &str) -> Result<()> {
        self.patch(
            &format!("fall-detection/logs/{log_id}/mark_alert_sent"),
            "fall alert update",
        )
        .await?;
        info!("Marked fall log {log_id} as alert_sent");
        Ok(())
    }
}
