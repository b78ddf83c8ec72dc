//! Environment configuration for both bots
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Facility UTC offset and reminder schedule path
//! - 1.0.0: Initial creation

use anyhow::Result;
use chrono::FixedOffset;

#[derive(Debug, Clone)]
pub struct Config {
    pub assistant_bot_token: Option<String>,
    pub reminders_bot_token: Option<String>,
    pub api_base_url: String,
    pub database_path: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub log_level: String,
    /// Hours east of UTC for the facility's wall clock (Singapore by default)
    pub facility_utc_offset_hours: i32,
    pub reminder_schedule_path: String,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        let assistant_bot_token = non_empty_var("ASSISTANT_BOT_TOKEN");
        let reminders_bot_token = non_empty_var("REMINDERS_BOT_TOKEN");

        if assistant_bot_token.is_none() && reminders_bot_token.is_none() {
            return Err(anyhow::anyhow!(
                "Neither ASSISTANT_BOT_TOKEN nor REMINDERS_BOT_TOKEN is set"
            ));
        }

        let api_base_url = match non_empty_var("API_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if reminders_bot_token.is_some() => {
                return Err(anyhow::anyhow!(
                    "API_BASE_URL is required when the reminders bot is enabled"
                ));
            }
            None => String::new(),
        };

        let facility_utc_offset_hours = match non_empty_var("FACILITY_UTC_OFFSET_HOURS") {
            Some(raw) => raw.parse::<i32>().map_err(|e| {
                anyhow::anyhow!("Invalid FACILITY_UTC_OFFSET_HOURS '{}': {}", raw, e)
            })?,
            None => 8,
        };

        let config = Config {
            assistant_bot_token,
            reminders_bot_token,
            api_base_url,
            database_path: non_empty_var("DATABASE_PATH")
                .unwrap_or_else(|| "caregiver.db".to_string()),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: non_empty_var("OPENAI_MODEL")
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            log_level: non_empty_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            facility_utc_offset_hours,
            reminder_schedule_path: non_empty_var("REMINDER_SCHEDULE_PATH")
                .unwrap_or_else(|| "reminders.yaml".to_string()),
        };

        // Fail at startup rather than on the first reminder
        config.facility_offset()?;

        Ok(config)
    }

    pub fn facility_offset(&self) -> Result<FixedOffset> {
        facility_offset(self.facility_utc_offset_hours)
    }
}

pub fn facility_offset(hours: i32) -> Result<FixedOffset> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {} hours", hours))
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
