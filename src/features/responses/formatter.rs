//! Chat text for query results
//!
//! Output is Telegram legacy Markdown. Free-form values (titles, names, notes)
//! are escaped so a stray `*` or `_` cannot break the message.

use crate::core::response::truncate_with_notice;
use crate::core::time::format_naive;
use crate::core::MAX_RESPONSE_LENGTH;
use crate::database::{Activity, Resident, Task};

pub mod templates {
    pub const NO_RESULTS: &str = "No results found matching your criteria.";
    pub const ERROR: &str =
        "I'm sorry, I encountered an error while processing your request. Please try again.";
    pub const UNKNOWN_COMMAND: &str =
        "I'm not sure how to help with that. You can ask me about tasks, residents, or activities.";
    pub const RESIDENT_NOT_FOUND: &str = "Sorry, I couldn't find a resident with that name.";
}

/// Entries shown before the overflow line
const LIST_PREVIEW: usize = 10;
const PROFILE_TASK_PREVIEW: usize = 5;

/// Escape legacy Markdown entity characters
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn time_span(start: Option<&chrono::NaiveDateTime>, end: Option<&chrono::NaiveDateTime>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!("{} to {}", format_naive(start), format_naive(end)),
        (Some(start), None) => format_naive(start),
        (None, Some(end)) => format!(" to {}", format_naive(end)),
        (None, None) => "Unknown time".to_string(),
    }
}

fn or_default(value: Option<&String>, fallback: &str) -> String {
    value.map(|v| escape_markdown(v)).unwrap_or_else(|| fallback.to_string())
}

#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    max_length: usize,
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        ResponseFormatter {
            max_length: MAX_RESPONSE_LENGTH,
        }
    }
}

impl ResponseFormatter {
    pub fn new(max_length: usize) -> Self {
        ResponseFormatter { max_length }
    }

    pub fn format_tasks(&self, tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return templates::NO_RESULTS.to_string();
        }

        let mut response = format!("📋 *Found {} tasks:*\n\n", tasks.len());
        for (idx, task) in tasks.iter().take(LIST_PREVIEW).enumerate() {
            let priority = task
                .priority
                .map(|p| p.to_string())
                .unwrap_or_else(|| "Not set".to_string());
            response.push_str(&format!(
                "{}. *{}*\n   Status: {} | Priority: {}\n   For: {} | By: {}\n   Time: {}\n\n",
                idx + 1,
                escape_markdown(&task.task_title),
                task.status,
                priority,
                or_default(task.assigned_for_name.as_ref(), "Not specified"),
                or_default(task.assigned_to_name.as_ref(), "Unassigned"),
                time_span(task.start_date.as_ref(), task.due_date.as_ref()),
            ));
        }
        if tasks.len() > LIST_PREVIEW {
            response.push_str(&format!(
                "...and {} more tasks (showing first {LIST_PREVIEW} only).",
                tasks.len() - LIST_PREVIEW
            ));
        }

        self.truncate(&response)
    }

    pub fn format_activities(&self, activities: &[Activity]) -> String {
        if activities.is_empty() {
            return templates::NO_RESULTS.to_string();
        }

        let mut response = format!("🗓️ *Found {} activities:*\n\n", activities.len());
        for (idx, activity) in activities.iter().take(LIST_PREVIEW).enumerate() {
            response.push_str(&format!(
                "{}. *{}*\n   Category: {} | Location: {}\n   Created by: {}\n   Time: {}\n\n",
                idx + 1,
                escape_markdown(&activity.title),
                or_default(activity.category.as_ref(), "Uncategorized"),
                or_default(activity.location.as_ref(), "No location"),
                or_default(activity.created_by_name.as_ref(), "Unknown"),
                time_span(activity.start_time.as_ref(), activity.end_time.as_ref()),
            ));
        }
        if activities.len() > LIST_PREVIEW {
            response.push_str(&format!(
                "...and {} more activities (showing first {LIST_PREVIEW} only).",
                activities.len() - LIST_PREVIEW
            ));
        }

        self.truncate(&response)
    }

    pub fn format_resident_list(&self, residents: &[Resident]) -> String {
        if residents.is_empty() {
            return templates::RESIDENT_NOT_FOUND.to_string();
        }

        let mut response = format!("👥 *Found {} residents:*\n\n", residents.len());
        for (idx, resident) in residents.iter().take(LIST_PREVIEW).enumerate() {
            response.push_str(&format!(
                "{}. *{}* (Room: {})\n\n",
                idx + 1,
                escape_markdown(&resident.full_name),
                or_default(resident.room_number.as_ref(), "Unknown"),
            ));
        }
        if residents.len() > LIST_PREVIEW {
            response.push_str(&format!(
                "...and {} more residents (showing first {LIST_PREVIEW} only).",
                residents.len() - LIST_PREVIEW
            ));
        }

        self.truncate(&response)
    }

    /// Profile card followed by the resident's most recent tasks
    pub fn format_resident_profile(&self, resident: &Resident, tasks: &[Task]) -> String {
        let name = escape_markdown(&resident.full_name);
        let mut response = format!("👤 *Resident Profile: {name}*\n");
        response.push_str(&format!(
            "Room: {}\n",
            or_default(resident.room_number.as_ref(), "Unknown")
        ));

        if !resident.medical_conditions.is_empty() {
            response.push_str(&format!(
                "Medical Conditions: {}\n",
                escape_markdown(&resident.medical_conditions.join(", "))
            ));
        }
        if !resident.medications.is_empty() {
            response.push_str(&format!(
                "Medications: {}\n",
                escape_markdown(&resident.medications.join(", "))
            ));
        }
        if !resident.notes.is_empty() {
            response.push_str("Notes:\n");
            for note in &resident.notes {
                response.push_str(&format!(
                    "- {} ({})\n",
                    escape_markdown(&note.text),
                    format_naive(&note.created_at)
                ));
            }
        }
        response.push('\n');

        if tasks.is_empty() {
            response.push_str("No recent tasks found for this resident.");
            return self.truncate(&response);
        }

        response.push_str(&format!("*Recent tasks for {name}:*\n\n"));
        for (idx, task) in tasks.iter().take(PROFILE_TASK_PREVIEW).enumerate() {
            response.push_str(&format!(
                "{}. *{}*\n   Status: {} | Assigned to: {}\n   Time: {}\n\n",
                idx + 1,
                escape_markdown(&task.task_title),
                task.status,
                or_default(task.assigned_to_name.as_ref(), "Unassigned"),
                task.start_date
                    .as_ref()
                    .map(format_naive)
                    .unwrap_or_else(|| "Unknown".to_string()),
            ));
        }
        if tasks.len() > PROFILE_TASK_PREVIEW {
            response.push_str(&format!(
                "...and {} more tasks (showing first {PROFILE_TASK_PREVIEW} only).",
                tasks.len() - PROFILE_TASK_PREVIEW
            ));
        }

        self.truncate(&response)
    }

    /// Reply for a name lookup that found nobody
    pub fn format_resident_not_found(&self, name: &str, suggestions: &[String]) -> String {
        let mut response = format!("I couldn't find a resident named '{name}'. ");
        if suggestions.is_empty() {
            response.push_str("Please check the spelling or try another resident name.");
        } else {
            response.push_str("Did you mean one of these residents?\n• ");
            response.push_str(&suggestions.join("\n• "));
        }
        response
    }

    fn truncate(&self, text: &str) -> String {
        truncate_with_notice(text, self.max_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::from_db;
    use crate::database::{ResidentNote, TaskPriority, TaskStatus};

    fn task(n: usize) -> Task {
        let mut task = Task::new(format!("t{n}"), format!("Task {n}"));
        task.start_date = from_db("2026-10-19 09:00:00");
        task
    }

    #[test]
    fn test_empty_lists_use_templates() {
        let formatter = ResponseFormatter::default();
        assert_eq!(formatter.format_tasks(&[]), templates::NO_RESULTS);
        assert_eq!(formatter.format_activities(&[]), templates::NO_RESULTS);
        assert_eq!(formatter.format_resident_list(&[]), templates::RESIDENT_NOT_FOUND);
    }

    #[test]
    fn test_task_entry_layout() {
        let mut bath = task(1);
        bath.task_title = "Bath".to_string();
        bath.status = TaskStatus::Overdue;
        bath.priority = Some(TaskPriority::High);
        bath.due_date = from_db("2026-10-19 10:00:00");
        bath.assigned_for_name = Some("Mary Tan".to_string());

        let text = ResponseFormatter::default().format_tasks(&[bath]);
        assert_eq!(
            text,
            "📋 *Found 1 tasks:*\n\n1. *Bath*\n   Status: Overdue | Priority: High\n   \
             For: Mary Tan | By: Unassigned\n   Time: 2026-10-19 09:00 to 2026-10-19 10:00\n\n"
        );
    }

    #[test]
    fn test_task_overflow_line() {
        let tasks: Vec<Task> = (1..=12).map(task).collect();
        let text = ResponseFormatter::default().format_tasks(&tasks);
        assert!(text.starts_with("📋 *Found 12 tasks:*"));
        assert!(text.contains("10. *Task 10*"));
        assert!(!text.contains("*Task 11*"));
        assert!(text.ends_with("...and 2 more tasks (showing first 10 only)."));
    }

    #[test]
    fn test_activity_defaults() {
        let mut bingo = Activity::new("a1", "Bingo");
        bingo.start_time = from_db("2026-10-19 15:00:00");
        let text = ResponseFormatter::default().format_activities(&[bingo]);
        assert!(text.contains("Category: Uncategorized | Location: No location"));
        assert!(text.contains("Created by: Unknown"));
        assert!(text.contains("Time: 2026-10-19 15:00\n"));
    }

    #[test]
    fn test_resident_list() {
        let residents = vec![Resident {
            id: "r1".to_string(),
            full_name: "Mary Tan".to_string(),
            room_number: Some("101".to_string()),
            ..Default::default()
        }];
        let text = ResponseFormatter::default().format_resident_list(&residents);
        assert_eq!(text, "👥 *Found 1 residents:*\n\n1. *Mary Tan* (Room: 101)\n\n");
    }

    #[test]
    fn test_profile_without_tasks() {
        let resident = Resident {
            id: "r1".to_string(),
            full_name: "Mary Tan".to_string(),
            medical_conditions: vec!["Diabetes".to_string(), "Asthma".to_string()],
            notes: vec![ResidentNote {
                text: "Ate well".to_string(),
                created_by: None,
                created_at: from_db("2026-10-19 12:00:00").unwrap(),
            }],
            ..Default::default()
        };
        let text = ResponseFormatter::default().format_resident_profile(&resident, &[]);
        assert!(text.starts_with("👤 *Resident Profile: Mary Tan*\nRoom: Unknown\n"));
        assert!(text.contains("Medical Conditions: Diabetes, Asthma\n"));
        assert!(!text.contains("Medications:"));
        assert!(text.contains("- Ate well (2026-10-19 12:00)\n"));
        assert!(text.ends_with("No recent tasks found for this resident."));
    }

    #[test]
    fn test_profile_task_preview() {
        let resident = Resident {
            full_name: "Mary Tan".to_string(),
            ..Default::default()
        };
        let tasks: Vec<Task> = (1..=7).map(task).collect();
        let text = ResponseFormatter::default().format_resident_profile(&resident, &tasks);
        assert!(text.contains("*Recent tasks for Mary Tan:*"));
        assert!(text.contains("5. *Task 5*"));
        assert!(text.ends_with("...and 2 more tasks (showing first 5 only)."));
    }

    #[test]
    fn test_markdown_is_escaped() {
        assert_eq!(escape_markdown("snake_case *bold* [x] `y`"), "snake\\_case \\*bold\\* \\[x] \\`y\\`");
        let text = ResponseFormatter::default().format_tasks(&[Task::new("t", "Check *meds*")]);
        assert!(text.contains("*Check \\*meds\\**"));
    }

    #[test]
    fn test_not_found_with_and_without_suggestions() {
        let formatter = ResponseFormatter::default();
        let suggestions = vec!["Mary Tan".to_string(), "Maryanne Koh".to_string()];
        let text = formatter.format_resident_not_found("mari", &suggestions);
        assert_eq!(
            text,
            "I couldn't find a resident named 'mari'. Did you mean one of these residents?\n• Mary Tan\n• Maryanne Koh"
        );
        let text = formatter.format_resident_not_found("zz", &[]);
        assert!(text.ends_with("Please check the spelling or try another resident name."));
    }

    #[test]
    fn test_long_output_truncated() {
        let formatter = ResponseFormatter::new(300);
        let tasks: Vec<Task> = (1..=10).map(task).collect();
        let text = formatter.format_tasks(&tasks);
        assert!(text.len() <= 300);
        assert!(text.ends_with("...(message truncated due to length)"));
    }
}
