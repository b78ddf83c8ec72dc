//! Records held in the local store

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Staff member allowed to talk to the bots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub telegram_handle: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resident {
    pub id: String,
    pub full_name: String,
    pub room_number: Option<String>,
    pub gender: Option<String>,
    pub medical_conditions: Vec<String>,
    pub medications: Vec<String>,
    /// Most recent first
    pub notes: Vec<ResidentNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidentNote {
    pub text: String,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Overdue,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Overdue => write!(f, "Overdue"),
            TaskStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "overdue" => Ok(TaskStatus::Overdue),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::High => write!(f, "High"),
            TaskPriority::Medium => write!(f, "Medium"),
            TaskPriority::Low => write!(f, "Low"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(TaskPriority::High),
            "medium" => Ok(TaskPriority::Medium),
            "low" => Ok(TaskPriority::Low),
            _ => Err(anyhow::anyhow!("Invalid task priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub task_title: String,
    pub task_details: String,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub start_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    /// Staff user id
    pub assigned_to: Option<String>,
    /// Resident id
    pub assigned_for: Option<String>,
    pub recurring: bool,
    /// Weekdays with Monday = 0
    pub recurring_days: Vec<u32>,
    pub assigned_to_name: Option<String>,
    pub assigned_for_name: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            task_title: title.into(),
            task_details: String::new(),
            status: TaskStatus::Pending,
            priority: None,
            start_date: None,
            due_date: None,
            assigned_to: None,
            assigned_for: None,
            recurring: false,
            recurring_days: Vec::new(),
            assigned_to_name: None,
            assigned_for_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub category: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub created_by: Option<String>,
    pub created_by_name: Option<String>,
}

impl Activity {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Activity {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            location: None,
            category: None,
            start_time: None,
            end_time: None,
            created_by: None,
            created_by_name: None,
        }
    }
}
