use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// A task document as stored in the `tasks` collection. Wire format is
/// camelCase; `taskId` is the public identifier used in URLs, `_id` stays
/// internal to Mongo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub task_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assignee_email: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Derived, never stored: past due and not yet completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != TaskStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(TaskStatus::Pending),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

/// Request payload for creating a task. Every field is optional at the serde
/// level so that a single validation pass can itemize all missing/invalid
/// fields instead of failing on the first one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_email: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Validated, normalized fields ready for insertion.
#[derive(Debug)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assignee_email: String,
    pub due_date: DateTime<Utc>,
}

impl CreateTaskRequest {
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTask, Vec<String>> {
        let mut errors = Vec::new();

        let title = self.title.as_deref().unwrap_or("").trim().to_string();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        } else if title.chars().count() > TITLE_MAX_LEN {
            errors.push("Title cannot exceed 100 characters".to_string());
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        if let Some(d) = &description {
            if d.chars().count() > DESCRIPTION_MAX_LEN {
                errors.push("Description cannot exceed 500 characters".to_string());
            }
        }

        let assignee_email = self
            .assignee_email
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        if assignee_email.is_empty() {
            errors.push("Assignee email is required".to_string());
        } else if !email_regex().is_match(&assignee_email) {
            errors.push("Please provide a valid email address".to_string());
        }

        let due_date = match self.due_date {
            Some(due) if due > now => Some(due),
            Some(_) => {
                errors.push("Due date must be in the future".to_string());
                None
            }
            None => {
                errors.push("Due date is required".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewTask {
            title,
            description,
            assignee_email,
            // due_date is Some whenever errors is empty
            due_date: due_date.unwrap_or(now),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Query parameters for GET /api/tasks. `status` is kept as a raw string so
/// an unknown value maps to a 400 instead of a deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub status: Option<String>,
    pub assignee_email: Option<String>,
    pub overdue: Option<String>,
}

/// A task plus the derived `isOverdue` flag, as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub is_overdue: bool,
}

impl TaskResponse {
    pub fn new(task: Task, now: DateTime<Utc>) -> Self {
        let is_overdue = task.is_overdue(now);
        TaskResponse { task, is_overdue }
    }
}

/// Listing order: ascending due date, ties broken by most recently created.
pub fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid email pattern"))
}
