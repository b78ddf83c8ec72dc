//! # Assistant Feature
//!
//! Answers staff questions about tasks, activities and residents from the
//! local store. Every operation returns a [`Reply`]; failures are logged and
//! become the generic error template, so nothing here surfaces an `Err`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use anyhow::Result;
use chrono::{Datelike, FixedOffset, NaiveDateTime};
use log::{error, info};
use std::sync::Arc;

use crate::core::time::{local_now, TimeRange};
use crate::database::{ActivityFilter, Database, StaffUser, TaskFilter, TaskStatus};
use crate::features::audio::{AudioTranscriber, NoteSummarizer};
use crate::features::query::{Intent, ParsedQuery, QueryParser};
use crate::features::responses::{escape_markdown, templates, ResponseFormatter};
use crate::message_components::{resident_followup_buttons, Reply, LIST_RESIDENTS, TODAY_TASKS};

/// Residents shown by `/residents`
pub const RESIDENT_LIST_LIMIT: i64 = 50;
/// Names offered when a lookup finds nobody
const SUGGESTION_LIMIT: i64 = 5;

pub const NOTE_USAGE: &str = "Usage: /note <resident name>: <note text>";
pub const VOICE_DISABLED: &str =
    "Sorry, voice notes are not available right now. Please type your message instead.";

const HELP_TEXT: &str = "Here is what you can ask me:\n\n\
    • \"What tasks are due today?\"\n\
    • \"Show high priority tasks this week\"\n\
    • \"Any overdue tasks?\"\n\
    • \"Upcoming activities in the main hall\"\n\
    • \"How is Mary Tan doing?\"\n\
    • \"List all residents\"\n\n\
    Commands:\n\
    /tasks - today's tasks\n\
    /activities - today's activities\n\
    /residents - all residents\n\
    /note <resident>: <text> - add a note to a resident\n\n\
    You can also send a voice note and I will transcribe and summarize it.";

struct VoiceNotes {
    transcriber: AudioTranscriber,
    summarizer: NoteSummarizer,
}

#[derive(Clone)]
pub struct AssistantService {
    database: Database,
    parser: Arc<QueryParser>,
    formatter: ResponseFormatter,
    offset: FixedOffset,
    voice: Option<Arc<VoiceNotes>>,
}

impl AssistantService {
    pub fn new(database: Database, offset: FixedOffset) -> Result<Self> {
        Ok(AssistantService {
            database,
            parser: Arc::new(QueryParser::new()?),
            formatter: ResponseFormatter::default(),
            offset,
            voice: None,
        })
    }

    /// Enable voice notes
    pub fn with_voice(mut self, transcriber: AudioTranscriber, summarizer: NoteSummarizer) -> Self {
        self.voice = Some(Arc::new(VoiceNotes {
            transcriber,
            summarizer,
        }));
        self
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice.is_some()
    }

    fn now(&self) -> NaiveDateTime {
        local_now(self.offset)
    }

    pub fn welcome(&self, user: &StaffUser) -> Reply {
        Reply::plain(format!(
            "Welcome, {}! How can I help you today? 🤖\n\nAsk me about tasks, activities or residents, or send /help for examples.",
            user.name
        ))
    }

    pub fn help(&self) -> Reply {
        Reply::plain(HELP_TEXT)
    }

    pub async fn list_residents(&self) -> Reply {
        match self.database.get_all_residents(RESIDENT_LIST_LIMIT).await {
            Ok(residents) => Reply::markdown(self.formatter.format_resident_list(&residents)),
            Err(e) => failure("listing residents", e),
        }
    }

    pub async fn today_tasks(&self) -> Reply {
        self.today_tasks_at(self.now()).await
    }

    pub async fn today_tasks_at(&self, now: NaiveDateTime) -> Reply {
        match self.database.get_today_tasks(now).await {
            Ok(tasks) => Reply::markdown(self.formatter.format_tasks(&tasks)),
            Err(e) => failure("fetching today's tasks", e),
        }
    }

    pub async fn today_activities(&self) -> Reply {
        self.today_activities_at(self.now()).await
    }

    pub async fn today_activities_at(&self, now: NaiveDateTime) -> Reply {
        match self.database.get_today_activities(now.date()).await {
            Ok(activities) => Reply::markdown(self.formatter.format_activities(&activities)),
            Err(e) => failure("fetching today's activities", e),
        }
    }

    /// `/note <resident>: <text>`
    pub async fn add_note(&self, user: &StaffUser, args: &str) -> Reply {
        self.add_note_at(user, args, self.now()).await
    }

    pub async fn add_note_at(&self, user: &StaffUser, args: &str, now: NaiveDateTime) -> Reply {
        let Some((name, note)) = args.split_once(':') else {
            return Reply::plain(NOTE_USAGE);
        };
        let (name, note) = (name.trim(), note.trim());
        if name.is_empty() || note.is_empty() {
            return Reply::plain(NOTE_USAGE);
        }

        let result: Result<Reply> = async {
            let Some(resident) = self.database.get_resident_by_name(name).await? else {
                return self.not_found(name).await;
            };
            if self
                .database
                .add_resident_note(&resident.id, note, Some(user.id.as_str()), now)
                .await?
            {
                info!("📝 {} added a note for {}", user.name, resident.full_name);
                Ok(Reply::plain(format!("📝 Note added for {}.", resident.full_name)))
            } else {
                Ok(Reply::plain(templates::ERROR))
            }
        }
        .await;
        result.unwrap_or_else(|e| failure("adding a note", e))
    }

    /// Answer a free-text message
    pub async fn answer(&self, text: &str) -> Reply {
        self.answer_at(text, self.now()).await
    }

    pub async fn answer_at(&self, text: &str, now: NaiveDateTime) -> Reply {
        let parsed = self.parser.parse_at(text, now);
        info!("Parsed query as {} ({:?})", parsed.intent, parsed.filters);
        match self.respond(&parsed, now).await {
            Ok(reply) => reply,
            Err(e) => failure(&format!("handling {}", parsed.intent), e),
        }
    }

    async fn respond(&self, parsed: &ParsedQuery, now: NaiveDateTime) -> Result<Reply> {
        match parsed.intent {
            Intent::TaskQuery => {
                let is_today = parsed.time_range == Some(TimeRange::day(now.date()));
                let filter = TaskFilter {
                    range: parsed.time_range,
                    status: parsed.filters.status,
                    priority: parsed.filters.priority,
                    recurring_weekday: is_today.then(|| now.weekday().num_days_from_monday()),
                    overdue_as_of: (parsed.filters.status == Some(TaskStatus::Overdue))
                        .then_some(now),
                    ..Default::default()
                };
                let tasks = self.database.get_tasks(&filter).await?;
                Ok(Reply::markdown(self.formatter.format_tasks(&tasks)))
            }
            Intent::ActivityQuery => {
                let filter = ActivityFilter {
                    range: parsed.time_range,
                    category: parsed.filters.category.clone(),
                    location: parsed.filters.location.clone(),
                };
                let activities = self.database.get_activities(&filter).await?;
                Ok(Reply::markdown(self.formatter.format_activities(&activities)))
            }
            Intent::ResidentQuery => {
                let name = parsed.filters.resident_name.as_deref().unwrap_or_default();
                self.resident(name, parsed.time_range).await
            }
            Intent::GeneralQuestion => Ok(Reply::plain(templates::UNKNOWN_COMMAND)),
        }
    }

    async fn resident(&self, name: &str, range: Option<TimeRange>) -> Result<Reply> {
        if name.trim().is_empty() {
            let residents = self.database.get_all_residents(RESIDENT_LIST_LIMIT).await?;
            return Ok(Reply::markdown(self.formatter.format_resident_list(&residents)));
        }

        info!("Searching for resident with name: '{name}'");
        let Some(resident) = self.database.get_resident_by_name(name).await? else {
            return self.not_found(name).await;
        };
        let tasks = self.database.get_resident_tasks(&resident.id, range).await?;
        Ok(
            Reply::markdown(self.formatter.format_resident_profile(&resident, &tasks))
                .with_buttons(resident_followup_buttons()),
        )
    }

    async fn not_found(&self, name: &str) -> Result<Reply> {
        info!("No resident found with name: '{name}'");
        let suggestions = self
            .database
            .similar_resident_names(name, SUGGESTION_LIMIT)
            .await
            .unwrap_or_else(|e| {
                error!("Error getting resident suggestions: {e}");
                Vec::new()
            });
        Ok(Reply::plain(
            self.formatter.format_resident_not_found(name, &suggestions),
        ))
    }

    /// Inline button presses under a resident profile
    pub async fn callback(&self, data: &str) -> Reply {
        match data {
            TODAY_TASKS => self.today_tasks().await,
            LIST_RESIDENTS => self.list_residents().await,
            other => {
                info!("Ignoring unknown callback: {other}");
                Reply::plain(templates::UNKNOWN_COMMAND)
            }
        }
    }

    /// Transcribe and summarize a voice note at `url`
    pub async fn voice_note(&self, url: &str, filename: &str, duration_seconds: u32) -> Reply {
        let Some(voice) = &self.voice else {
            return Reply::plain(VOICE_DISABLED);
        };

        let result: Result<Reply> = async {
            let transcription = voice
                .transcriber
                .download_and_transcribe(url, filename, duration_seconds)
                .await?;
            let summary = voice.summarizer.summarize(&transcription.text).await?;
            Ok(Reply::markdown(format!(
                "🎙️ *Transcript* ({}s):\n{}\n\n📝 *Summary:*\n{}",
                transcription.duration_seconds,
                escape_markdown(transcription.text.trim()),
                escape_markdown(&summary),
            )))
        }
        .await;
        result.unwrap_or_else(|e| failure("processing a voice note", e))
    }
}

fn failure(context: &str, e: anyhow::Error) -> Reply {
    error!("Error {context}: {e}");
    Reply::plain(templates::ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::from_db;
    use crate::database::{Activity, Resident, Task, TaskPriority};

    fn staff() -> StaffUser {
        StaffUser {
            id: "u1".to_string(),
            name: "Nora".to_string(),
            email: "nora@example.com".to_string(),
            role: "caregiver".to_string(),
            telegram_handle: "nora".to_string(),
        }
    }

    fn resident(id: &str, name: &str) -> Resident {
        Resident {
            id: id.to_string(),
            full_name: name.to_string(),
            room_number: Some("101".to_string()),
            ..Default::default()
        }
    }

    // 2026-10-21 is a Wednesday
    fn now() -> NaiveDateTime {
        from_db("2026-10-21 10:30:00").unwrap()
    }

    async fn service() -> AssistantService {
        let db = Database::in_memory().await.unwrap();
        db.add_user(&staff()).await.unwrap();
        db.add_resident(&resident("r1", "Mary Tan")).await.unwrap();
        db.add_resident(&resident("r2", "John Lim")).await.unwrap();

        let mut bath = Task::new("t1", "Assist with bath");
        bath.start_date = from_db("2026-10-21 09:00:00");
        bath.priority = Some(TaskPriority::High);
        bath.assigned_for = Some("r1".to_string());
        db.insert_task(&bath).await.unwrap();

        let mut walk = Task::new("t2", "Morning walk");
        walk.start_date = from_db("2026-10-14 08:00:00");
        walk.recurring = true;
        walk.recurring_days = vec![2];
        db.insert_task(&walk).await.unwrap();

        let mut late = Task::new("t3", "Change bedding");
        late.start_date = from_db("2026-10-20 08:00:00");
        late.due_date = from_db("2026-10-20 12:00:00");
        db.insert_task(&late).await.unwrap();

        let mut bingo = Activity::new("a1", "Bingo");
        bingo.location = Some("Main Hall".to_string());
        bingo.category = Some("Social".to_string());
        bingo.start_time = from_db("2026-10-21 15:00:00");
        bingo.end_time = from_db("2026-10-21 16:00:00");
        db.insert_activity(&bingo).await.unwrap();

        AssistantService::new(db, FixedOffset::east_opt(8 * 3600).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_today_tasks_include_recurring() {
        let service = service().await;
        let reply = service.today_tasks_at(now()).await;
        assert!(reply.markdown);
        assert!(reply.text.starts_with("📋 *Found 2 tasks:*"));
        assert!(reply.text.contains("Morning walk"));

        let asked = service.answer_at("what tasks do I have today", now()).await;
        assert!(asked.text.contains("Found 2 tasks"));
    }

    #[tokio::test]
    async fn test_filtered_task_query() {
        let service = service().await;
        let reply = service.answer_at("high priority tasks this week", now()).await;
        assert!(reply.text.contains("Found 1 tasks"));
        assert!(reply.text.contains("Assist with bath"));

        let overdue = service.answer_at("overdue tasks", now()).await;
        assert!(overdue.text.contains("Change bedding"));
        assert!(!overdue.text.contains("Assist with bath"));
    }

    #[tokio::test]
    async fn test_activity_query() {
        let service = service().await;
        let reply = service.answer_at("activities in the main hall today", now()).await;
        assert!(reply.text.contains("Bingo"));

        let none = service.answer_at("activities in the garden", now()).await;
        assert_eq!(none.text, templates::NO_RESULTS);
        assert!(service.today_activities_at(now()).await.text.contains("Bingo"));
    }

    #[tokio::test]
    async fn test_resident_profile_has_buttons() {
        let service = service().await;
        let reply = service.answer_at("how is mary tan doing", now()).await;
        assert!(reply.text.starts_with("👤 *Resident Profile: Mary Tan*"));
        assert!(reply.text.contains("Assist with bath"));
        assert_eq!(reply.buttons, resident_followup_buttons());
    }

    #[tokio::test]
    async fn test_resident_not_found_suggests_names() {
        let service = service().await;
        let reply = service.answer_at("tell me about marty", now()).await;
        assert!(!reply.markdown);
        assert!(reply.text.starts_with("I couldn't find a resident named 'marty'."));
        assert!(reply.text.contains("• Mary Tan"));
        assert!(reply.buttons.is_empty());
    }

    #[tokio::test]
    async fn test_resident_plural_lists_everyone() {
        let service = service().await;
        let reply = service.answer_at("show me all residents", now()).await;
        assert!(reply.text.starts_with("👥 *Found 2 residents:*"));
        assert_eq!(service.callback(LIST_RESIDENTS).await.text, reply.text);
    }

    #[tokio::test]
    async fn test_general_question() {
        let service = service().await;
        let reply = service.answer_at("what is the meaning of life anyway", now()).await;
        assert_eq!(reply.text, templates::UNKNOWN_COMMAND);
    }

    #[tokio::test]
    async fn test_add_note() {
        let service = service().await;
        let user = staff();
        assert_eq!(service.add_note_at(&user, "no colon here", now()).await.text, NOTE_USAGE);
        assert_eq!(service.add_note_at(&user, "Mary Tan:   ", now()).await.text, NOTE_USAGE);

        let reply = service
            .add_note_at(&user, "mary tan: Ate well at lunch", now())
            .await;
        assert_eq!(reply.text, "📝 Note added for Mary Tan.");

        let profile = service.answer_at("tell me about mary tan", now()).await;
        assert!(profile.text.contains("Ate well at lunch"));

        let missing = service.add_note_at(&user, "Zed: hello", now()).await;
        assert!(missing.text.starts_with("I couldn't find a resident named 'Zed'."));
    }

    #[tokio::test]
    async fn test_voice_disabled_without_key() {
        let service = service().await;
        assert!(!service.voice_enabled());
        let reply = service.voice_note("http://localhost/none", "file.oga", 3).await;
        assert_eq!(reply.text, VOICE_DISABLED);
    }

    #[tokio::test]
    async fn test_unknown_callback() {
        let service = service().await;
        assert_eq!(service.callback("bogus").await.text, templates::UNKNOWN_COMMAND);
    }
}
