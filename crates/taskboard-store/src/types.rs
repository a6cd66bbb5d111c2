//! Core types for the task entity.
//!
//! Serialized field names stay snake_case and status values stay uppercase
//! to match the JSON wire format the dashboard already speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started.
    Open,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// SQL string representation (matches the `SQLite` CHECK constraint).
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }

    /// Parse the SQL string representation.
    #[must_use]
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "IN_PROGRESS" => Some(Self::InProgress),
            "DONE" => Some(Self::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A tracked task row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Row id.
    pub id: i64,
    /// Title, 1–200 characters.
    pub title: String,
    /// Optional free-text description, up to 1000 characters.
    pub description: Option<String>,
    /// Workflow status.
    pub status: TaskStatus,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp (UTC).
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskCreateParams {
    /// Title (required).
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Initial status; defaults to [`TaskStatus::Open`].
    pub status: Option<TaskStatus>,
}

/// Parameters for a partial task update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdateParams {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New status.
    pub status: Option<TaskStatus>,
}

impl TaskUpdateParams {
    /// Whether this update touches nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Field a task listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    /// Row id.
    Id,
    /// Title.
    Title,
    /// Status.
    Status,
    /// Creation time.
    CreatedAt,
    /// Last-update time.
    UpdatedAt,
}

impl OrderField {
    /// Allowed field names, for validation messages.
    pub const VALID_FIELDS: [&'static str; 5] =
        ["id", "title", "status", "created_at", "updated_at"];

    /// SQL column name.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Parse a column name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "status" => Some(Self::Status),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

/// Listing order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// SQL keyword.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse `asc`/`desc`, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Validated listing query, produced by the service layer.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Optional status filter.
    pub status: Option<TaskStatus>,
    /// Optional title substring filter.
    pub title_contains: Option<String>,
    /// Ordering column.
    pub order_by: OrderField,
    /// Ordering direction.
    pub order_direction: OrderDirection,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 12,
            status: None,
            title_contains: None,
            order_by: OrderField::CreatedAt,
            order_direction: OrderDirection::Desc,
        }
    }
}

/// One page of tasks plus paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResult {
    /// Tasks on this page.
    pub items: Vec<Task>,
    /// Total rows matching the filter.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Total page count for this filter and size.
    pub pages: u64,
}

/// Per-status row counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Tasks in `OPEN`.
    #[serde(rename = "OPEN")]
    pub open: u64,
    /// Tasks in `IN_PROGRESS`.
    #[serde(rename = "IN_PROGRESS")]
    pub in_progress: u64,
    /// Tasks in `DONE`.
    #[serde(rename = "DONE")]
    pub done: u64,
    /// All tasks.
    pub total: u64,
}
