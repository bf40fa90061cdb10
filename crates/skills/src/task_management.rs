//! Life OS task management: create, update, list, filter and summarize tasks.
//!
//! Writes are never performed here. Creating or updating a task produces an
//! approval-tier action for the worker; reads and deletes go straight to the
//! Life OS backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::error;

use otto_skill::{Action, Skill, SkillContext, SkillHealthIssue, Task, TaskResult};

use crate::life_os::{LifeOsClient, LifeOsError};

/// Actions that change Life OS data need approval
const WRITE_TIER: u8 = 1;
const DEFAULT_LIST_LIMIT: u64 = 50;
const SUMMARY_LIMIT: u64 = 500;

const HANDLED_TYPES: &[&str] = &[
    "life_os.create_task",
    "life_os.list_tasks",
    "life_os.update_task",
    "life_os.delete_task",
    "life_os.summarize_tasks",
    "life_os.find_overdue",
    "life_os.find_by_category",
    "life_os.find_by_assignee",
    "life_os.get_task",
];

pub struct TaskManagementSkill {
    client: LifeOsClient,
}

impl TaskManagementSkill {
    pub fn new(life_os_api_url: &str) -> Self {
        Self {
            client: LifeOsClient::new(life_os_api_url),
        }
    }

    fn create_task(&self, task: &Task) -> TaskResult {
        let title = task.param_str("title");
        let action = Action::new(
            "life_os.create_task",
            WRITE_TIER,
            json!({
                "title": title,
                "description": task.param::<Value>("description"),
                "assignee": task.param::<Value>("assignee"),
                "due_date": task.param::<Value>("due_date"),
                "priority": task.param_str("priority").unwrap_or("medium"),
                "category": task.param::<Value>("category"),
            }),
        );

        TaskResult::success(
            &task.id,
            format!("Will create task: {}", title.unwrap_or("Untitled")),
        )
        .with_actions(vec![action])
    }

    fn update_task(&self, task: &Task, task_id: String) -> TaskResult {
        let mut payload = json!({ "task_id": task_id });
        for field in [
            "title",
            "description",
            "status",
            "assignee",
            "due_date",
            "priority",
            "category",
        ] {
            payload[field] = task.param::<Value>(field).unwrap_or(Value::Null);
        }

        TaskResult::success(&task.id, format!("Will update task #{}", task_id))
            .with_actions(vec![Action::new(
                "life_os.update_task_status",
                WRITE_TIER,
                payload,
            )])
    }

    async fn list_tasks(&self, task: &Task, filters: &[(&str, &str)]) -> TaskResult {
        let mut query: Vec<(&str, String)> = filters
            .iter()
            .map(|(key, value)| (*key, value.to_string()))
            .collect();
        query.push((
            "limit",
            task.param::<u64>("limit").unwrap_or(DEFAULT_LIST_LIMIT).to_string(),
        ));

        match self.client.list_tasks(&query).await {
            Ok(tasks) => {
                let mut message = format!("Found {} task(s)", tasks.len());
                if let Some((_, status)) = filters.iter().find(|(key, _)| *key == "status") {
                    message.push_str(&format!(" with status: {}", status));
                }
                let count = tasks.len();
                TaskResult::success(&task.id, message)
                    .with_data(json!({ "tasks": tasks, "count": count }))
            }
            Err(e) => fetch_failure(task, "Failed to fetch tasks", "Error fetching tasks", e),
        }
    }

    async fn delete_task(&self, task: &Task, task_id: String) -> TaskResult {
        match self.client.delete_task(&task_id).await {
            Ok(()) => TaskResult::success(&task.id, format!("Deleted task #{}", task_id)),
            Err(LifeOsError::NotFound) => {
                TaskResult::failure(&task.id, format!("Task #{} not found", task_id))
            }
            Err(e) => fetch_failure(task, "Failed to delete task", "Error deleting task", e),
        }
    }

    async fn get_task(&self, task: &Task, task_id: String) -> TaskResult {
        match self.client.get_task(&task_id).await {
            Ok(found) => {
                let title = found.get("title").and_then(Value::as_str).unwrap_or("");
                TaskResult::success(
                    &task.id,
                    format!("Retrieved task #{}: {}", task_id, title),
                )
                .with_data(json!({ "task": found }))
            }
            Err(LifeOsError::NotFound) => {
                TaskResult::failure(&task.id, format!("Task #{} not found", task_id))
            }
            Err(e) => fetch_failure(task, "Failed to fetch task", "Error fetching task", e),
        }
    }

    async fn summarize_tasks(&self, task: &Task) -> TaskResult {
        let query = [("limit", SUMMARY_LIMIT.to_string())];
        match self.client.list_tasks(&query).await {
            Ok(tasks) => {
                let summary = summarize(&tasks, Utc::now());
                let mut message = format!("Task Summary: {} total tasks", summary.total);
                if summary.overdue > 0 {
                    message.push_str(&format!(", {} overdue", summary.overdue));
                }
                if summary.due_today > 0 {
                    message.push_str(&format!(", {} due today", summary.due_today));
                }
                if summary.due_this_week > 0 {
                    message.push_str(&format!(", {} due this week", summary.due_this_week));
                }
                TaskResult::success(&task.id, message).with_data(json!(summary))
            }
            Err(e) => fetch_failure(
                task,
                "Failed to fetch tasks for summary",
                "Error summarizing tasks",
                e,
            ),
        }
    }

    async fn find_overdue(&self, task: &Task) -> TaskResult {
        let query = [("limit", SUMMARY_LIMIT.to_string())];
        match self.client.list_tasks(&query).await {
            Ok(tasks) => {
                let overdue = overdue_tasks(tasks, Utc::now());
                let count = overdue.len();
                TaskResult::success(&task.id, format!("Found {} overdue task(s)", count))
                    .with_data(json!({ "tasks": overdue, "count": count }))
            }
            Err(e) => fetch_failure(
                task,
                "Failed to fetch tasks",
                "Error finding overdue tasks",
                e,
            ),
        }
    }
}

#[async_trait]
impl Skill for TaskManagementSkill {
    fn name(&self) -> &str {
        "task_management"
    }

    fn description(&self) -> &str {
        "Manages Life OS tasks: create, update, list, filter, and summarize tasks"
    }

    fn can_handle(&self, task: &Task) -> bool {
        HANDLED_TYPES.contains(&task.task_type.as_str())
    }

    async fn run(&self, task: &Task, _ctx: &SkillContext) -> otto_skill::Result<TaskResult> {
        let result = match task.task_type.as_str() {
            "life_os.create_task" => self.create_task(task),
            "life_os.update_task" => match task.require_str("task_id") {
                Ok(id) => self.update_task(task, id),
                Err(e) => missing_field(task, e),
            },
            "life_os.list_tasks" => {
                let filters: Vec<(&str, &str)> = ["status", "assignee", "category"]
                    .into_iter()
                    .filter_map(|key| task.param_str(key).map(|value| (key, value)))
                    .collect();
                self.list_tasks(task, &filters).await
            }
            "life_os.delete_task" => match task.require_str("task_id") {
                Ok(id) => self.delete_task(task, id).await,
                Err(e) => missing_field(task, e),
            },
            "life_os.get_task" => match task.require_str("task_id") {
                Ok(id) => self.get_task(task, id).await,
                Err(e) => missing_field(task, e),
            },
            "life_os.summarize_tasks" => self.summarize_tasks(task).await,
            "life_os.find_overdue" => self.find_overdue(task).await,
            "life_os.find_by_category" => match task.require_str("category") {
                Ok(category) => self.list_tasks(task, &[("category", category.as_str())]).await,
                Err(e) => missing_field(task, e),
            },
            "life_os.find_by_assignee" => match task.require_str("assignee") {
                Ok(assignee) => self.list_tasks(task, &[("assignee", assignee.as_str())]).await,
                Err(e) => missing_field(task, e),
            },
            other => TaskResult::failure(&task.id, format!("Unknown task type: {}", other)),
        };
        Ok(result)
    }

    async fn self_test(&self, _ctx: &SkillContext) -> Vec<SkillHealthIssue> {
        let message = match self.client.health().await {
            Ok(()) => return Vec::new(),
            Err(LifeOsError::Status(status)) => {
                format!("Life OS API returned status {}", status.as_u16())
            }
            Err(e) => format!("Cannot reach Life OS API: {}", e),
        };
        vec![SkillHealthIssue::new("life_os_api_unreachable", message)
            .with_suggestion("Ensure Life OS backend is running and LIFE_OS_API_URL is correct")]
    }
}

fn missing_field(task: &Task, e: otto_skill::SkillError) -> TaskResult {
    // InvalidInput already carries "Missing required field: '...'"
    let message = match e {
        otto_skill::SkillError::InvalidInput(msg) => msg,
        other => other.to_string(),
    };
    TaskResult::failure(&task.id, message)
}

fn fetch_failure(task: &Task, status_prefix: &str, error_prefix: &str, e: LifeOsError) -> TaskResult {
    match e {
        LifeOsError::NotFound => TaskResult::failure(&task.id, format!("{}: 404", status_prefix)),
        LifeOsError::Status(status) => {
            TaskResult::failure(&task.id, format!("{}: {}", status_prefix, status.as_u16()))
        }
        LifeOsError::Transport(e) => {
            error!("{}: {}", error_prefix, e);
            TaskResult::failure(&task.id, format!("{}: {}", error_prefix, e))
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct TaskSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_assignee: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
}

/// Counts over a task list relative to `now`
pub fn summarize(tasks: &[Value], now: DateTime<Utc>) -> TaskSummary {
    let week_from_now = now + Duration::days(7);
    let mut summary = TaskSummary {
        total: tasks.len(),
        ..Default::default()
    };

    for t in tasks {
        *summary
            .by_status
            .entry(text_or(t, "status", "unknown"))
            .or_default() += 1;
        *summary
            .by_assignee
            .entry(text_or(t, "assignee", "unassigned"))
            .or_default() += 1;
        *summary
            .by_category
            .entry(text_or(t, "category", "uncategorized"))
            .or_default() += 1;

        if let Some(due) = due_date(t) {
            if due < now {
                summary.overdue += 1;
            } else if due.date_naive() == now.date_naive() {
                summary.due_today += 1;
            } else if due <= week_from_now {
                summary.due_this_week += 1;
            }
        }
    }
    summary
}

/// Tasks past their due date that are not done
pub fn overdue_tasks(tasks: Vec<Value>, now: DateTime<Utc>) -> Vec<Value> {
    tasks
        .into_iter()
        .filter(|t| {
            let done = t.get("status").and_then(Value::as_str) == Some("done");
            !done && due_date(t).map(|due| due < now).unwrap_or(false)
        })
        .collect()
}

fn text_or(task: &Value, key: &str, fallback: &str) -> String {
    task.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Accepts RFC 3339, naive ISO datetimes (taken as UTC) and plain dates
fn due_date(task: &Value) -> Option<DateTime<Utc>> {
    let raw = task.get("due_date")?.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
