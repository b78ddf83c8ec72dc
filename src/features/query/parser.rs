//! Free-text query parsing
//!
//! Turns a staff message into an [`Intent`], an optional [`TimeRange`] and
//! [`QueryFilters`] by trying ordered regex rules; the first rule that matches wins.

use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, FixedOffset, NaiveDateTime};
use log::{debug, error, info};
use regex::Regex;

use crate::core::time::{day_bounds, local_now, TimeRange};
use crate::database::{TaskPriority, TaskStatus};

/// What the message is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    TaskQuery,
    ActivityQuery,
    ResidentQuery,
    GeneralQuestion,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::TaskQuery => write!(f, "task_query"),
            Intent::ActivityQuery => write!(f, "activity_query"),
            Intent::ResidentQuery => write!(f, "resident_query"),
            Intent::GeneralQuestion => write!(f, "general_question"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub location: Option<String>,
    pub category: Option<String>,
    /// Empty when the message asks about residents in general
    pub resident_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub intent: Intent,
    pub time_range: Option<TimeRange>,
    pub filters: QueryFilters,
}

impl ParsedQuery {
    fn general() -> Self {
        ParsedQuery {
            intent: Intent::GeneralQuestion,
            time_range: None,
            filters: QueryFilters::default(),
        }
    }
}

const ACTIVITY_CATEGORIES: &[&str] = &[
    "Medication",
    "Exercise",
    "Social",
    "Entertainment",
    "Education",
];

const RESIDENT_INDICATORS: &[&str] = &[
    "resident",
    "patient",
    "how is",
    "tell me about",
    "profile",
    "details",
    "information",
    "status",
    "what happened to",
    "show resident",
];

/// Words that end a location phrase
const LOCATION_STOP_WORDS: &[&str] = &[
    "today", "tomorrow", "yesterday", "this", "last", "next", "on", "at", "for", "with",
];

#[derive(Debug, Clone, Copy)]
enum DayPhrase {
    Today,
    Tomorrow,
    Yesterday,
    ThisWeek,
}

pub struct QueryParser {
    task: Regex,
    activity: Regex,
    day_phrases: Vec<(DayPhrase, Regex)>,
    last_hours: Regex,
    statuses: Vec<(TaskStatus, Regex)>,
    priorities: Vec<(TaskPriority, Regex)>,
    location: Regex,
    categories: Vec<(&'static str, Regex)>,
    plural_residents: Regex,
    trailing_time: Regex,
    name_patterns: Vec<Regex>,
}

impl QueryParser {
    pub fn new() -> Result<Self> {
        let word = |w: &str| Regex::new(&format!(r"\b{w}\b"));

        // A name: letters, spaces, apostrophes and hyphens
        const NAME: &str = r"([a-z][a-z'\-\s]*?)";

        Ok(QueryParser {
            task: Regex::new(r"\btasks?\b")?,
            activity: Regex::new(r"\bactivit(?:y|ies)\b|\bupcoming\b|\bscheduled\b")?,
            day_phrases: vec![
                (DayPhrase::Today, word("today")?),
                (DayPhrase::Tomorrow, word("tomorrow")?),
                (DayPhrase::Yesterday, word("yesterday")?),
                (DayPhrase::ThisWeek, Regex::new(r"\bthis\s+week\b")?),
            ],
            last_hours: Regex::new(r"\blast\s+(\d+)\s+hours?\b")?,
            statuses: vec![
                (TaskStatus::Overdue, word("overdue")?),
                (TaskStatus::Pending, word("pending")?),
                (TaskStatus::Completed, word("completed")?),
            ],
            priorities: vec![
                (TaskPriority::High, Regex::new(r"\bhigh\s+priority\b")?),
                (TaskPriority::Medium, Regex::new(r"\bmedium\s+priority\b")?),
                (TaskPriority::Low, Regex::new(r"\blow\s+priority\b")?),
            ],
            location: Regex::new(r"\bin\s+(?:the\s+)?([a-z][a-z0-9\s]*)")?,
            categories: ACTIVITY_CATEGORIES
                .iter()
                .map(|c| Ok((*c, word(&c.to_lowercase())?)))
                .collect::<Result<Vec<_>, regex::Error>>()?,
            plural_residents: word("residents")?,
            trailing_time: Regex::new(
                r"\s+(?:today|tomorrow|yesterday|this\s+week|in\s+the\s+last\s+\d+\s+hours?|last\s+\d+\s+hours?)$",
            )?,
            name_patterns: vec![
                Regex::new(&format!(r"^how\s+is\s+{NAME}(?:\s+doing)?$"))?,
                Regex::new(&format!(r"^what\s+happened\s+to\s+{NAME}$"))?,
                Regex::new(&format!(
                    r"^tell\s+me\s+about\s+(?:resident\s+|patient\s+)?{NAME}$"
                ))?,
                Regex::new(&format!(
                    r"^show\s+(?:me\s+)?(?:resident\s+|patient\s+)?{NAME}$"
                ))?,
                Regex::new(&format!(
                    r"^(?:find|look\s+up|search\s+for)\s+(?:resident\s+|patient\s+)?{NAME}$"
                ))?,
                Regex::new(&format!(r"^(?:resident|patient)\s+{NAME}$"))?,
                Regex::new(&format!(
                    r"^{NAME}\s+(?:info|information|details|profile|status)$"
                ))?,
            ],
        })
    }

    /// Parse against the current facility time
    pub fn parse(&self, text: &str, offset: FixedOffset) -> ParsedQuery {
        self.parse_at(text, local_now(offset))
    }

    /// Parse with an explicit facility-local "now". Never fails; problems
    /// degrade to [`Intent::GeneralQuestion`].
    pub fn parse_at(&self, text: &str, now: NaiveDateTime) -> ParsedQuery {
        match self.try_parse(text, now) {
            Ok(parsed) => {
                debug!(
                    "Parsed query as {} (range: {:?}, filters: {:?})",
                    parsed.intent, parsed.time_range, parsed.filters
                );
                parsed
            }
            Err(e) => {
                error!("Error parsing query: {e}");
                ParsedQuery::general()
            }
        }
    }

    fn try_parse(&self, text: &str, now: NaiveDateTime) -> Result<ParsedQuery> {
        let text = text.trim().to_lowercase();

        if text.contains("today") && text.contains("task") {
            let (start, end) = day_bounds(now.date());
            info!("Detected today's tasks query");
            return Ok(ParsedQuery {
                intent: Intent::TaskQuery,
                time_range: Some(TimeRange::new(start, end)),
                filters: self.task_filters(&text),
            });
        }

        if self.task.is_match(&text) {
            return Ok(ParsedQuery {
                intent: Intent::TaskQuery,
                time_range: self.time_range(&text, now)?,
                filters: self.task_filters(&text),
            });
        }

        if self.activity.is_match(&text) {
            return Ok(ParsedQuery {
                intent: Intent::ActivityQuery,
                time_range: self.time_range(&text, now)?,
                filters: self.activity_filters(&text),
            });
        }

        if is_resident_query(&text) {
            return Ok(ParsedQuery {
                intent: Intent::ResidentQuery,
                time_range: self.time_range(&text, now)?,
                filters: QueryFilters {
                    resident_name: Some(self.resident_name(&text)),
                    ..Default::default()
                },
            });
        }

        Ok(ParsedQuery::general())
    }

    fn time_range(&self, text: &str, now: NaiveDateTime) -> Result<Option<TimeRange>> {
        for (phrase, re) in &self.day_phrases {
            if !re.is_match(text) {
                continue;
            }
            let today = now.date();
            let range = match phrase {
                DayPhrase::Today => TimeRange::day(today),
                DayPhrase::Tomorrow => TimeRange::day(
                    today.succ_opt().ok_or_else(|| anyhow!("date out of range"))?,
                ),
                DayPhrase::Yesterday => TimeRange::day(
                    today.pred_opt().ok_or_else(|| anyhow!("date out of range"))?,
                ),
                DayPhrase::ThisWeek => {
                    let monday =
                        today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                    TimeRange::new(day_bounds(monday).0, now)
                }
            };
            return Ok(Some(range));
        }

        if let Some(caps) = self.last_hours.captures(text) {
            let hours = caps[1].parse::<i64>().ok();
            let range = hours
                .and_then(Duration::try_hours)
                .and_then(|span| now.checked_sub_signed(span))
                .map(|start| TimeRange::new(start, now));
            if range.is_none() {
                debug!("Ignoring out-of-range hour span '{}'", &caps[1]);
            }
            return Ok(range);
        }

        Ok(None)
    }

    fn task_filters(&self, text: &str) -> QueryFilters {
        QueryFilters {
            status: self
                .statuses
                .iter()
                .find(|(_, re)| re.is_match(text))
                .map(|(status, _)| *status),
            priority: self
                .priorities
                .iter()
                .find(|(_, re)| re.is_match(text))
                .map(|(priority, _)| *priority),
            ..Default::default()
        }
    }

    fn activity_filters(&self, text: &str) -> QueryFilters {
        let location = self.location.captures(text).and_then(|caps| {
            let words: Vec<&str> = caps[1]
                .split_whitespace()
                .take_while(|w| !LOCATION_STOP_WORDS.contains(w))
                .collect();
            if words.is_empty() {
                None
            } else {
                Some(words.join(" "))
            }
        });

        QueryFilters {
            location,
            category: self
                .categories
                .iter()
                .find(|(_, re)| re.is_match(text))
                .map(|(category, _)| category.to_string()),
            ..Default::default()
        }
    }

    /// Best guess at the resident a message names; empty means "everyone"
    fn resident_name(&self, text: &str) -> String {
        let cleaned = text
            .trim_end_matches(|c: char| matches!(c, '?' | '!' | '.'))
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if self.plural_residents.is_match(&cleaned) {
            info!("Query asks about residents in general");
            return String::new();
        }

        let cleaned = self.trailing_time.replace(&cleaned, "").to_string();

        for pattern in &self.name_patterns {
            if let Some(caps) = pattern.captures(&cleaned) {
                let name = caps[1].trim().to_string();
                if !name.is_empty() {
                    info!("Extracted resident name from direct pattern: '{name}'");
                    return name;
                }
            }
        }

        let word_count = cleaned.split_whitespace().count();
        if (1..=3).contains(&word_count) {
            info!("Treating short message as a resident name: '{cleaned}'");
            return cleaned;
        }

        info!("No resident name found in: '{text}'");
        String::new()
    }
}

fn is_resident_query(text: &str) -> bool {
    RESIDENT_INDICATORS.iter().any(|i| text.contains(i))
        || (1..=3).contains(&text.split_whitespace().count())
}
