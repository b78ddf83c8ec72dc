use anyhow::Result;
use chrono::{Datelike, NaiveDateTime};
use log::{debug, warn};
use sqlite::{State, Statement};

use super::{bind_all, execute_with, non_empty, Database, Param, Task, TaskPriority, TaskStatus};
use crate::core::time::{from_db, to_db, TimeRange};

/// Most tasks returned by one query
pub const TASK_QUERY_LIMIT: i64 = 100;

const TASK_SELECT: &str = "
    SELECT t.id, t.task_title, t.task_details, t.status, t.priority,
           t.start_date, t.due_date, t.assigned_to, t.assigned_for,
           t.recurring, t.recurring_days,
           COALESCE(u.name, '') AS assigned_to_name,
           COALESCE(r.full_name, '') AS assigned_for_name
    FROM tasks t
    LEFT JOIN users u ON u.id = t.assigned_to
    LEFT JOIN residents r ON r.id = t.assigned_for";

/// Conditions for [`Database::get_tasks`]; unset fields do not filter
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Matched against the start date
    pub range: Option<TimeRange>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub resident_id: Option<String>,
    /// Recurring tasks on this weekday (Monday = 0) match regardless of range
    pub recurring_weekday: Option<u32>,
    /// Pending tasks due before this moment also count as `Overdue`
    pub overdue_as_of: Option<NaiveDateTime>,
}

impl TaskFilter {
    fn where_clause(&self) -> (String, Vec<Param>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        match (&self.range, self.recurring_weekday) {
            (Some(range), Some(weekday)) => {
                clauses.push(
                    "((t.start_date >= ? AND t.start_date <= ?)
                      OR (t.recurring = 1 AND (',' || t.recurring_days || ',') LIKE ?))"
                        .to_string(),
                );
                params.push(to_db(&range.start).into());
                params.push(to_db(&range.end).into());
                params.push(format!("%,{weekday},%").into());
            }
            (Some(range), None) => {
                clauses.push("t.start_date >= ? AND t.start_date <= ?".to_string());
                params.push(to_db(&range.start).into());
                params.push(to_db(&range.end).into());
            }
            (None, Some(weekday)) => {
                clauses.push(
                    "t.recurring = 1 AND (',' || t.recurring_days || ',') LIKE ?".to_string(),
                );
                params.push(format!("%,{weekday},%").into());
            }
            (None, None) => {}
        }

        match (self.status, self.overdue_as_of) {
            (Some(TaskStatus::Overdue), Some(now)) => {
                clauses.push(
                    "(t.status = 'Overdue'
                      OR (t.status = 'Pending' AND t.due_date != '' AND t.due_date < ?))"
                        .to_string(),
                );
                params.push(to_db(&now).into());
            }
            (Some(status), _) => {
                clauses.push("t.status = ?".to_string());
                params.push(status.to_string().into());
            }
            (None, _) => {}
        }

        if let Some(priority) = self.priority {
            clauses.push("t.priority = ?".to_string());
            params.push(priority.to_string().into());
        }

        if let Some(resident_id) = &self.resident_id {
            clauses.push("t.assigned_for = ?".to_string());
            params.push(resident_id.as_str().into());
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

fn read_task(statement: &Statement<'_>) -> Result<Task> {
    let status: String = statement.read("status")?;
    let status = status.parse().unwrap_or_else(|_| {
        warn!("Unknown task status '{status}', treating as Pending");
        TaskStatus::Pending
    });
    let priority: String = statement.read("priority")?;
    let start_date: String = statement.read("start_date")?;
    let due_date: String = statement.read("due_date")?;
    let recurring_days: String = statement.read("recurring_days")?;

    Ok(Task {
        id: statement.read("id")?,
        task_title: statement.read("task_title")?,
        task_details: statement.read("task_details")?,
        status,
        priority: priority.parse().ok(),
        start_date: from_db(&start_date),
        due_date: from_db(&due_date),
        assigned_to: non_empty(statement.read("assigned_to")?),
        assigned_for: non_empty(statement.read("assigned_for")?),
        recurring: statement.read::<i64, _>("recurring")? != 0,
        recurring_days: recurring_days
            .split(',')
            .filter_map(|day| day.trim().parse().ok())
            .collect(),
        assigned_to_name: non_empty(statement.read("assigned_to_name")?),
        assigned_for_name: non_empty(statement.read("assigned_for_name")?),
    })
}

impl Database {
    pub async fn insert_task(&self, task: &Task) -> Result<()> {
        let recurring_days = task
            .recurring_days
            .iter()
            .map(|day| day.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let conn = self.connection.lock().await;
        execute_with(
            &conn,
            "INSERT OR REPLACE INTO tasks
             (id, task_title, task_details, status, priority, start_date, due_date,
              assigned_to, assigned_for, recurring, recurring_days)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            &[
                task.id.as_str().into(),
                task.task_title.as_str().into(),
                task.task_details.as_str().into(),
                task.status.to_string().into(),
                task.priority.map(|p| p.to_string()).unwrap_or_default().into(),
                task.start_date.as_ref().map(to_db).unwrap_or_default().into(),
                task.due_date.as_ref().map(to_db).unwrap_or_default().into(),
                task.assigned_to.clone().unwrap_or_default().into(),
                task.assigned_for.clone().unwrap_or_default().into(),
                Param::Int(i64::from(task.recurring)),
                recurring_days.into(),
            ],
        )
    }

    /// Tasks matching `filter`, newest start date first, enriched with assignee and resident names
    pub async fn get_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let (where_clause, mut params) = filter.where_clause();
        params.push(Param::Int(TASK_QUERY_LIMIT));
        let sql = format!("{TASK_SELECT}{where_clause} ORDER BY t.start_date DESC LIMIT ?");
        debug!("Task query: {filter:?}");

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(&sql)?;
        bind_all(&mut statement, &params)?;

        let mut tasks = Vec::new();
        while let State::Row = statement.next()? {
            tasks.push(read_task(&statement)?);
        }
        Ok(tasks)
    }

    /// Tasks starting today plus recurring tasks scheduled for today's weekday
    pub async fn get_today_tasks(&self, now: NaiveDateTime) -> Result<Vec<Task>> {
        self.get_tasks(&TaskFilter {
            range: Some(TimeRange::day(now.date())),
            recurring_weekday: Some(now.weekday().num_days_from_monday()),
            ..Default::default()
        })
        .await
    }

    pub async fn get_resident_tasks(
        &self,
        resident_id: &str,
        range: Option<TimeRange>,
    ) -> Result<Vec<Task>> {
        self.get_tasks(&TaskFilter {
            range,
            resident_id: Some(resident_id.to_string()),
            ..Default::default()
        })
        .await
    }
}
