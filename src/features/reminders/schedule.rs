//! # Reminder Schedule Configuration
//!
//! Optional YAML file tuning the poll intervals and reminder windows.
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_INTERVAL_SECS: u64 = 86_400;
const MAX_LOOKAHEAD_DAYS: i64 = 30;
const MAX_WINDOW_MINUTES: i64 = 1_440;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReminderSchedule {
    /// Activity poll interval
    #[serde(default = "default_activity_interval")]
    pub activity_interval_secs: u64,

    /// Task poll interval
    #[serde(default = "default_task_interval")]
    pub task_interval_secs: u64,

    /// Fall log poll interval
    #[serde(default = "default_fall_interval")]
    pub fall_interval_secs: u64,

    /// How often queued medication jobs are checked
    #[serde(default = "default_medication_tick")]
    pub medication_tick_secs: u64,

    /// Facility-local time of the daily medication pass, `HH:MM`
    #[serde(default = "default_daily_medication_time")]
    pub daily_medication_time: String,

    /// Activities and tasks further ahead than this are ignored
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,

    /// Lead time when a record does not carry its own
    #[serde(default = "default_lead_minutes")]
    pub default_lead_minutes: i64,

    /// How far back each fall poll looks
    #[serde(default = "default_fall_lookback")]
    pub fall_lookback_minutes: i64,
}

fn default_activity_interval() -> u64 {
    10
}

fn default_task_interval() -> u64 {
    15
}

fn default_fall_interval() -> u64 {
    30
}

fn default_medication_tick() -> u64 {
    20
}

fn default_daily_medication_time() -> String {
    "00:01".to_string()
}

fn default_lookahead_days() -> i64 {
    2
}

fn default_lead_minutes() -> i64 {
    5
}

fn default_fall_lookback() -> i64 {
    5
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        ReminderSchedule {
            activity_interval_secs: default_activity_interval(),
            task_interval_secs: default_task_interval(),
            fall_interval_secs: default_fall_interval(),
            medication_tick_secs: default_medication_tick(),
            daily_medication_time: default_daily_medication_time(),
            lookahead_days: default_lookahead_days(),
            default_lead_minutes: default_lead_minutes(),
            fall_lookback_minutes: default_fall_lookback(),
        }
    }
}

impl ReminderSchedule {
    /// Load the schedule from a YAML file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let schedule: ReminderSchedule = if contents.trim().is_empty() {
            ReminderSchedule::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("activity_interval_secs", self.activity_interval_secs),
            ("task_interval_secs", self.task_interval_secs),
            ("fall_interval_secs", self.fall_interval_secs),
            ("medication_tick_secs", self.medication_tick_secs),
        ];
        for (name, value) in intervals {
            if value == 0 || value > MAX_INTERVAL_SECS {
                return Err(anyhow!(
                    "{name} must be between 1 and {MAX_INTERVAL_SECS} (got {value})"
                ));
            }
        }
        if !(1..=MAX_LOOKAHEAD_DAYS).contains(&self.lookahead_days) {
            return Err(anyhow!(
                "lookahead_days must be between 1 and {MAX_LOOKAHEAD_DAYS} (got {})",
                self.lookahead_days
            ));
        }
        if !(0..=MAX_WINDOW_MINUTES).contains(&self.default_lead_minutes) {
            return Err(anyhow!(
                "default_lead_minutes must be between 0 and {MAX_WINDOW_MINUTES} (got {})",
                self.default_lead_minutes
            ));
        }
        if !(1..=MAX_WINDOW_MINUTES).contains(&self.fall_lookback_minutes) {
            return Err(anyhow!(
                "fall_lookback_minutes must be between 1 and {MAX_WINDOW_MINUTES} (got {})",
                self.fall_lookback_minutes
            ));
        }
        self.daily_time()?;
        Ok(())
    }

    /// The daily medication pass time
    pub fn daily_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_medication_time, "%H:%M").map_err(|e| {
            anyhow!(
                "Invalid daily_medication_time '{}' (expected HH:MM): {}",
                self.daily_medication_time,
                e
            )
        })
    }

    pub fn activity_interval(&self) -> Duration {
        Duration::from_secs(self.activity_interval_secs)
    }

    pub fn task_interval(&self) -> Duration {
        Duration::from_secs(self.task_interval_secs)
    }

    pub fn fall_interval(&self) -> Duration {
        Duration::from_secs(self.fall_interval_secs)
    }

    pub fn medication_tick(&self) -> Duration {
        Duration::from_secs(self.medication_tick_secs)
    }
}
