use anyhow::Result;
use chrono::NaiveDate;
use log::debug;
use sqlite::{State, Statement};

use super::{bind_all, execute_with, like_escape, non_empty, Activity, Database, Param};
use crate::core::time::{from_db, to_db, TimeRange};

pub const ACTIVITY_QUERY_LIMIT: i64 = 20;

const ACTIVITY_SELECT: &str = "
    SELECT a.id, a.title, a.description, a.location, a.category,
           a.start_time, a.end_time, a.created_by,
           COALESCE(u.name, '') AS created_by_name
    FROM activities a
    LEFT JOIN users u ON u.id = a.created_by";

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    /// Matches when either the start or the end lies inside
    pub range: Option<TimeRange>,
    /// Exact category name
    pub category: Option<String>,
    /// Case-insensitive substring of the location
    pub location: Option<String>,
}

impl ActivityFilter {
    fn where_clause(&self) -> (String, Vec<Param>) {
        let mut clauses = Vec::new();
        let mut params: Vec<Param> = Vec::new();

        if let Some(range) = &self.range {
            clauses.push(
                "((a.start_time >= ? AND a.start_time <= ?)
                  OR (a.end_time >= ? AND a.end_time <= ?))",
            );
            for _ in 0..2 {
                params.push(to_db(&range.start).into());
                params.push(to_db(&range.end).into());
            }
        }
        if let Some(category) = &self.category {
            clauses.push("a.category = ?");
            params.push(category.as_str().into());
        }
        if let Some(location) = &self.location {
            clauses.push("LOWER(a.location) LIKE ? ESCAPE '\\'");
            params.push(format!("%{}%", like_escape(&location.to_lowercase())).into());
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

fn read_activity(statement: &Statement<'_>) -> Result<Activity> {
    let start_time: String = statement.read("start_time")?;
    let end_time: String = statement.read("end_time")?;
    Ok(Activity {
        id: statement.read("id")?,
        title: statement.read("title")?,
        description: statement.read("description")?,
        location: non_empty(statement.read("location")?),
        category: non_empty(statement.read("category")?),
        start_time: from_db(&start_time),
        end_time: from_db(&end_time),
        created_by: non_empty(statement.read("created_by")?),
        created_by_name: non_empty(statement.read("created_by_name")?),
    })
}

impl Database {
    pub async fn insert_activity(&self, activity: &Activity) -> Result<()> {
        let conn = self.connection.lock().await;
        execute_with(
            &conn,
            "INSERT OR REPLACE INTO activities
             (id, title, description, location, category, start_time, end_time, created_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            &[
                activity.id.as_str().into(),
                activity.title.as_str().into(),
                activity.description.as_str().into(),
                activity.location.clone().unwrap_or_default().into(),
                activity.category.clone().unwrap_or_default().into(),
                activity.start_time.as_ref().map(to_db).unwrap_or_default().into(),
                activity.end_time.as_ref().map(to_db).unwrap_or_default().into(),
                activity.created_by.clone().unwrap_or_default().into(),
            ],
        )
    }

    /// Activities matching `filter`, latest start first
    pub async fn get_activities(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        let (where_clause, mut params) = filter.where_clause();
        params.push(Param::Int(ACTIVITY_QUERY_LIMIT));
        let sql = format!("{ACTIVITY_SELECT}{where_clause} ORDER BY a.start_time DESC LIMIT ?");
        debug!("Activity query: {filter:?}");

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(&sql)?;
        bind_all(&mut statement, &params)?;

        let mut activities = Vec::new();
        while let State::Row = statement.next()? {
            activities.push(read_activity(&statement)?);
        }
        Ok(activities)
    }

    pub async fn get_activities_by_time_range(&self, range: TimeRange) -> Result<Vec<Activity>> {
        self.get_activities(&ActivityFilter {
            range: Some(range),
            ..Default::default()
        })
        .await
    }

    pub async fn get_activities_by_category(&self, category: &str) -> Result<Vec<Activity>> {
        self.get_activities(&ActivityFilter {
            category: Some(category.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn get_activities_by_location(&self, location: &str) -> Result<Vec<Activity>> {
        self.get_activities(&ActivityFilter {
            location: Some(location.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn get_today_activities(&self, today: NaiveDate) -> Result<Vec<Activity>> {
        self.get_activities_by_time_range(TimeRange::day(today)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, title: &str, start: &str, end: &str) -> Activity {
        let mut activity = Activity::new(id, title);
        activity.start_time = from_db(start);
        activity.end_time = from_db(end);
        activity
    }

    async fn seeded() -> Database {
        let db = Database::in_memory().await.unwrap();

        let mut bingo = activity("a1", "Bingo", "2026-10-19 15:00:00", "2026-10-19 16:00:00");
        bingo.category = Some("Social".to_string());
        bingo.location = Some("Main Hall".to_string());
        db.insert_activity(&bingo).await.unwrap();

        let mut yoga = activity("a2", "Chair Yoga", "2026-10-20 09:00:00", "2026-10-20 10:00:00");
        yoga.category = Some("Exercise".to_string());
        yoga.location = Some("Garden".to_string());
        db.insert_activity(&yoga).await.unwrap();

        // Starts the evening before, ends on the 19th
        let vigil = activity("a3", "Night Vigil", "2026-10-18 22:00:00", "2026-10-19 01:00:00");
        db.insert_activity(&vigil).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_today_matches_start_or_end() {
        let db = seeded().await;
        let today = from_db("2026-10-19 00:00:00").unwrap().date();
        let activities = db.get_today_activities(today).await.unwrap();
        let ids: Vec<_> = activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[tokio::test]
    async fn test_location_is_case_insensitive_substring() {
        let db = seeded().await;
        let activities = db.get_activities_by_location("main").await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].title, "Bingo");
        assert!(db.get_activities_by_location("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_is_exact() {
        let db = seeded().await;
        assert_eq!(db.get_activities_by_category("Exercise").await.unwrap().len(), 1);
        assert!(db.get_activities_by_category("exer").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_combined_filter() {
        let db = seeded().await;
        let filter = ActivityFilter {
            range: Some(TimeRange::day(from_db("2026-10-20 00:00:00").unwrap().date())),
            category: Some("Exercise".to_string()),
            location: Some("GARDEN".to_string()),
        };
        let activities = db.get_activities(&filter).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].id, "a2");
    }
}
