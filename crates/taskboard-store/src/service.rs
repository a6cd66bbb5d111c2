//! Business logic layer for task management.
//!
//! Wraps the repository with input validation, pagination limits, and
//! change detection. Key rules:
//!
//! - **Title**: required, trimmed, 1–200 characters.
//! - **Description**: optional, trimmed, ≤1000 characters; a blank string
//!   collapses to `None`.
//! - **Listing**: 1-based page, size 1–100, `title_contains` at least 2
//!   characters, ordering restricted to known columns.
//! - **Updates** report the previous row and a changed-field map so the
//!   caller can broadcast an update event after commit.

use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::errors::{Result, StoreError};
use crate::repository::TaskRepository;
use crate::types::{
    ListQuery, OrderDirection, OrderField, StatusCounts, Task, TaskCreateParams, TaskListResult,
    TaskStatus, TaskUpdateParams,
};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 1000;
const PAGE_SIZE_MAX: u32 = 100;
const SEARCH_TERM_MIN: usize = 2;

/// Result of a task update: the new row, the row it replaced, and the
/// fields that actually changed (empty when the update was a no-op).
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// Updated row.
    pub task: Task,
    /// Row state before the update.
    pub previous: Task,
    /// Changed fields mapped to their new values.
    pub changed_fields: Map<String, Value>,
}

/// Task service with validation and change detection.
pub struct TaskService;

impl TaskService {
    /// Create a task.
    pub fn create_task(conn: &Connection, params: &TaskCreateParams) -> Result<Task> {
        let title = validate_title(&params.title)?;
        let description = validate_description(params.description.as_deref())?;
        let status = params.status.unwrap_or(TaskStatus::Open);
        TaskRepository::create_task(conn, &title, description.as_deref(), status)
    }

    /// Fetch a task by id, erroring when absent.
    pub fn get_task(conn: &Connection, id: i64) -> Result<Task> {
        TaskRepository::get_task(conn, id)?.ok_or(StoreError::NotFound { id })
    }

    /// List tasks with validated pagination, filtering, and ordering.
    ///
    /// `order_by`/`order_direction` arrive as client strings and are checked
    /// against the closed column set.
    pub fn list_tasks(
        conn: &Connection,
        page: u32,
        size: u32,
        status: Option<TaskStatus>,
        title_contains: Option<&str>,
        order_by: &str,
        order_direction: &str,
    ) -> Result<TaskListResult> {
        if page < 1 {
            return Err(StoreError::Validation(
                "Page number must be greater than 0".into(),
            ));
        }
        if size < 1 || size > PAGE_SIZE_MAX {
            return Err(StoreError::Validation(format!(
                "Page size must be between 1 and {PAGE_SIZE_MAX}"
            )));
        }
        let order_by = OrderField::parse(order_by).ok_or_else(|| {
            StoreError::Validation(format!(
                "Invalid order_by field. Must be one of: {}",
                OrderField::VALID_FIELDS.join(", ")
            ))
        })?;
        let order_direction = OrderDirection::parse(order_direction).ok_or_else(|| {
            StoreError::Validation("Order direction must be 'asc' or 'desc'".into())
        })?;
        let title_contains = match title_contains {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.len() < SEARCH_TERM_MIN {
                    return Err(StoreError::Validation(format!(
                        "Search term must be at least {SEARCH_TERM_MIN} characters long"
                    )));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        let query = ListQuery {
            page,
            size,
            status,
            title_contains,
            order_by,
            order_direction,
        };
        let (items, total) = TaskRepository::list_tasks(conn, &query)?;
        let pages = if total > 0 {
            (total + u64::from(size) - 1) / u64::from(size)
        } else {
            0
        };
        Ok(TaskListResult {
            items,
            total,
            page,
            size,
            pages,
        })
    }

    /// Apply a partial update with change detection.
    ///
    /// An empty update returns the current row with no changed fields.
    pub fn update_task(
        conn: &Connection,
        id: i64,
        updates: &TaskUpdateParams,
    ) -> Result<UpdateOutcome> {
        let previous = Self::get_task(conn, id)?;

        let mut validated = updates.clone();
        if let Some(ref title) = updates.title {
            validated.title = Some(validate_title(title)?);
        }
        if let Some(ref description) = updates.description {
            // A blank description clears the field.
            validated.description = Some(
                validate_description(Some(description))?.unwrap_or_default(),
            );
        }

        let task = TaskRepository::update_task(conn, id, &validated)?
            .ok_or(StoreError::NotFound { id })?;

        let mut changed_fields = Map::new();
        if task.title != previous.title {
            let _ = changed_fields.insert("title".into(), Value::String(task.title.clone()));
        }
        if task.description != previous.description {
            let _ = changed_fields.insert(
                "description".into(),
                task.description
                    .clone()
                    .map_or(Value::Null, Value::String),
            );
        }
        if task.status != previous.status {
            let _ = changed_fields.insert(
                "status".into(),
                Value::String(task.status.as_sql().to_string()),
            );
        }

        Ok(UpdateOutcome {
            task,
            previous,
            changed_fields,
        })
    }

    /// Delete a task, returning its final state for the deletion event.
    pub fn delete_task(conn: &Connection, id: i64) -> Result<Task> {
        let task = Self::get_task(conn, id)?;
        if !TaskRepository::delete_task(conn, id)? {
            return Err(StoreError::NotFound { id });
        }
        Ok(task)
    }

    /// Per-status counts plus the total.
    pub fn status_counts(conn: &Connection) -> Result<StatusCounts> {
        TaskRepository::status_counts(conn)
    }
}

fn validate_title(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(
            "Title cannot be empty or just whitespace".into(),
        ));
    }
    if trimmed.chars().count() > TITLE_MAX {
        return Err(StoreError::Validation(format!(
            "Title cannot exceed {TITLE_MAX} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_description(raw: Option<&str>) -> Result<Option<String>> {
    match raw {
        None => Ok(None),
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.chars().count() > DESCRIPTION_MAX {
                return Err(StoreError::Validation(format!(
                    "Description cannot exceed {DESCRIPTION_MAX} characters"
                )));
            }
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::open_pool;

    fn test_conn() -> (tempfile::TempDir, crate::connection::TaskPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir.path().join("tasks.db"), 2).unwrap();
        (dir, pool)
    }

    fn create(conn: &Connection, title: &str) -> Task {
        TaskService::create_task(
            conn,
            &TaskCreateParams {
                title: title.into(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn create_trims_title_and_defaults_status() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let task = create(&conn, "  spaced out  ");
        assert_eq!(task.title, "spaced out");
        assert_eq!(task.status, TaskStatus::Open);
    }

    #[test]
    fn create_rejects_blank_title() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let err = TaskService::create_task(
            &conn,
            &TaskCreateParams {
                title: "   ".into(),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(StoreError::Validation(_))));
    }

    #[test]
    fn create_rejects_oversized_title() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let err = TaskService::create_task(
            &conn,
            &TaskCreateParams {
                title: "x".repeat(201),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(StoreError::Validation(_))));
    }

    #[test]
    fn blank_description_collapses_to_none() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let task = TaskService::create_task(
            &conn,
            &TaskCreateParams {
                title: "t".into(),
                description: Some("   ".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(task.description, None);
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        assert!(matches!(
            TaskService::get_task(&conn, 77),
            Err(StoreError::NotFound { id: 77 })
        ));
    }

    #[test]
    fn update_reports_changed_fields() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let task = create(&conn, "before");

        let outcome = TaskService::update_task(
            &conn,
            task.id,
            &TaskUpdateParams {
                title: Some("after".into()),
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.task.title, "after");
        assert_eq!(outcome.previous.title, "before");
        assert_eq!(outcome.changed_fields["title"], "after");
        assert_eq!(outcome.changed_fields["status"], "DONE");
        assert!(!outcome.changed_fields.contains_key("description"));
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let task = create(&conn, "stable");

        let outcome =
            TaskService::update_task(&conn, task.id, &TaskUpdateParams::default()).unwrap();
        assert_eq!(outcome.task, task);
        assert!(outcome.changed_fields.is_empty());
    }

    #[test]
    fn update_missing_is_not_found() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let err = TaskService::update_task(
            &conn,
            9000,
            &TaskUpdateParams {
                title: Some("ghost".into()),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(StoreError::NotFound { id: 9000 })));
    }

    #[test]
    fn delete_returns_final_state() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        let task = create(&conn, "short lived");

        let deleted = TaskService::delete_task(&conn, task.id).unwrap();
        assert_eq!(deleted.id, task.id);
        assert!(matches!(
            TaskService::get_task(&conn, task.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_rejects_bad_pagination() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        assert!(matches!(
            TaskService::list_tasks(&conn, 0, 10, None, None, "created_at", "desc"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            TaskService::list_tasks(&conn, 1, 101, None, None, "created_at", "desc"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn list_rejects_unknown_order_field() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        assert!(matches!(
            TaskService::list_tasks(&conn, 1, 10, None, None, "priority", "desc"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            TaskService::list_tasks(&conn, 1, 10, None, None, "id", "sideways"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn list_rejects_short_search_term() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        assert!(matches!(
            TaskService::list_tasks(&conn, 1, 10, None, Some("x"), "created_at", "desc"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn list_computes_page_count() {
        let (_dir, pool) = test_conn();
        let conn = pool.get().unwrap();
        for i in 0..5 {
            let _ = create(&conn, &format!("task {i}"));
        }

        let result =
            TaskService::list_tasks(&conn, 1, 2, None, None, "id", "asc").unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.pages, 3);
        assert_eq!(result.items.len(), 2);
    }
}
