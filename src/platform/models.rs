//! Records served by the care platform REST API
//!
//! The API is loose about types: ids and room numbers arrive as strings or
//! numbers, optional fields may be missing or `null`. Everything here
//! deserializes leniently and keeps timestamps as the raw strings; callers
//! parse them with [`crate::core::time::parse_api_timestamp`]. List
//! responses are decoded one record at a time so a malformed record is
//! dropped on its own.

use log::error;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Decode each element of a list response, logging and skipping the bad ones
pub fn decode_records<T: DeserializeOwned>(values: Vec<Value>, what: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value::<T>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                error!("Skipping malformed {what} record #{idx}: {e}");
                None
            }
        })
        .collect()
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_string))
}

/// `null` counts as false
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiActivity {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub start_time: Option<String>,
    #[serde(default)]
    pub reminder_minutes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub reminder_sent: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTask {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub task_title: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub task_details: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub remind_prior: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub reminder_sent: bool,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub resident_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub resident_room: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResident {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Day,
    Week,
    Custom,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMedication {
    #[serde(default)]
    pub medication_name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub instructions: Option<String>,
    /// `YYYY-MM-DD`, possibly followed by a time
    pub start_date: String,
    pub end_date: String,
    pub schedule_type: ScheduleType,
    /// Every N days or weeks
    #[serde(default)]
    pub repeat: Option<i64>,
    /// `Mon`..`Sun`
    #[serde(default)]
    pub days_of_week: Vec<String>,
    #[serde(default)]
    pub times_of_day: Vec<TimeOfDay>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallStatus {
    Pending,
    Confirmed,
    Other(String),
}

impl From<String> for FallStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => FallStatus::Pending,
            "confirmed" => FallStatus::Confirmed,
            _ => FallStatus::Other(value),
        }
    }
}

/// Fall event; the id arrives as `_id` or `id`
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawFallLog")]
pub struct FallLog {
    pub id: Option<String>,
    pub status: FallStatus,
    pub timestamp: Option<String>,
    pub resident_id: Option<String>,
    pub acceleration_magnitude: f64,
    pub alert_sent: bool,
}

#[derive(Deserialize)]
struct RawFallLog {
    #[serde(rename = "_id", default)]
    mongo_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    resident_id: Option<Value>,
    #[serde(default)]
    acceleration_magnitude: Option<f64>,
    #[serde(default)]
    alert_sent: Option<bool>,
}

impl From<RawFallLog> for FallLog {
    fn from(raw: RawFallLog) -> Self {
        FallLog {
            id: raw
                .mongo_id
                .and_then(value_to_string)
                .or_else(|| raw.id.and_then(value_to_string)),
            status: raw.status.unwrap_or_default().into(),
            timestamp: raw.timestamp,
            resident_id: raw.resident_id.and_then(value_to_string),
            acceleration_magnitude: raw.acceleration_magnitude.unwrap_or(0.0),
            alert_sent: raw.alert_sent.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_defaults() {
        let activity: ApiActivity = serde_json::from_str(
            r#"{"id": 7, "title": "Bingo", "start_time": "2026-10-19T07:00:00Z",
                "reminder_minutes": null, "reminder_sent": null, "location": ""}"#,
        )
        .unwrap();
        assert_eq!(activity.id, "7");
        assert_eq!(activity.reminder_minutes, None);
        assert!(!activity.reminder_sent);
        assert_eq!(activity.location, None);
    }

    #[test]
    fn test_bad_record_does_not_sink_the_list() {
        let values: Vec<Value> = serde_json::from_str(
            r#"[{"id": "t1", "task_title": "Bath", "start_date": "2026-10-19T07:00:00Z"},
                {"id": null, "task_title": "Lunch", "start_date": "2026-10-19T08:00:00Z"},
                {"id": "t3", "task_title": "Walk", "start_date": null},
                "garbage"]"#,
        )
        .unwrap();
        let tasks: Vec<ApiTask> = decode_records(values, "task");
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert_eq!(tasks[1].start_date, None);

        let values: Vec<Value> = serde_json::from_str(
            r#"[{"id": null, "start_time": "2026-10-19T07:00:00Z"},
                {"id": 8, "title": "Tai chi", "start_time": "2026-10-19T07:00:00Z"}]"#,
        )
        .unwrap();
        let activities: Vec<ApiActivity> = decode_records(values, "activity");
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].id, "8");
    }

    #[test]
    fn test_task_room_as_number() {
        let task: ApiTask = serde_json::from_str(
            r#"{"id": "t1", "task_title": "Bath", "start_date": "2026-10-19T07:00:00",
                "resident_room": 101, "remind_prior": 10, "priority": "High"}"#,
        )
        .unwrap();
        assert_eq!(task.resident_room.as_deref(), Some("101"));
        assert_eq!(task.remind_prior, Some(10));
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_medication_schedule() {
        let med: ApiMedication = serde_json::from_str(
            r#"{"medication_name": "Metformin", "dosage": 500, "start_date": "2026-10-01",
                "end_date": "2026-11-01", "schedule_type": "week", "repeat": 2,
                "days_of_week": ["Mon", "Thu"], "times_of_day": [{"hour": 8, "minute": 5}]}"#,
        )
        .unwrap();
        assert_eq!(med.schedule_type, ScheduleType::Week);
        assert_eq!(med.dosage.as_deref(), Some("500"));
        assert_eq!(med.times_of_day[0], TimeOfDay { hour: 8, minute: 5 });

        let odd: ApiMedication = serde_json::from_str(
            r#"{"start_date": "2026-10-01", "end_date": "2026-11-01", "schedule_type": "monthly"}"#,
        )
        .unwrap();
        assert_eq!(odd.schedule_type, ScheduleType::Unknown);
    }

    #[test]
    fn test_fall_log_id_variants() {
        let mongo: FallLog = serde_json::from_str(
            r#"{"_id": "f1", "status": "pending", "timestamp": "2026-10-19T07:00:00Z",
                "resident_id": "r1", "acceleration_magnitude": 2.5}"#,
        )
        .unwrap();
        assert_eq!(mongo.id.as_deref(), Some("f1"));
        assert_eq!(mongo.status, FallStatus::Pending);
        assert!(!mongo.alert_sent);

        let plain: FallLog =
            serde_json::from_str(r#"{"id": 42, "status": "false_alarm", "alert_sent": true}"#)
                .unwrap();
        assert_eq!(plain.id.as_deref(), Some("42"));
        assert_eq!(plain.status, FallStatus::Other("false_alarm".to_string()));
        assert_eq!(plain.acceleration_magnitude, 0.0);
        assert!(plain.alert_sent);
    }
}
