//! Task CRUD routes.
//!
//! Handlers stay thin: check out a pool connection, delegate to
//! [`TaskService`], then fire the matching broadcast trigger after the
//! mutation has committed. Broadcast failures never affect the HTTP
//! response.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use taskboard_store::{
    StatusCounts, StoreError, Task, TaskCreateParams, TaskListResult, TaskService, TaskStatus,
    TaskUpdateParams,
};
use tracing::instrument;

use crate::errors::ApiError;
use crate::state::AppState;

/// Query parameters for `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default from settings).
    pub size: Option<u32>,
    /// Status filter.
    pub status: Option<TaskStatus>,
    /// Title substring filter, at least 2 characters.
    pub title_contains: Option<String>,
    /// Ordering column (default `created_at`).
    pub order_by: Option<String>,
    /// Ordering direction (default `desc`).
    pub order_direction: Option<String>,
}

/// `GET /api/tasks` — one page of tasks with filtering and ordering.
#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<TaskListResult>, ApiError> {
    let conn = state.pool.get().map_err(StoreError::from)?;
    let result = TaskService::list_tasks(
        &conn,
        params.page.unwrap_or(1),
        params
            .size
            .unwrap_or(state.settings.pagination.default_page_size),
        params.status,
        params.title_contains.as_deref(),
        params.order_by.as_deref().unwrap_or("created_at"),
        params.order_direction.as_deref().unwrap_or("desc"),
    )?;
    Ok(Json(result))
}

/// `GET /api/tasks/counts` — per-status task counts.
#[instrument(skip(state))]
pub async fn task_counts(State(state): State<AppState>) -> Result<Json<StatusCounts>, ApiError> {
    let conn = state.pool.get().map_err(StoreError::from)?;
    Ok(Json(TaskService::status_counts(&conn)?))
}

/// `POST /api/tasks` — create a task and announce it.
#[instrument(skip(state, params))]
pub async fn create_task(
    State(state): State<AppState>,
    Json(params): Json<TaskCreateParams>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let conn = state.pool.get().map_err(StoreError::from)?;
    let task = TaskService::create_task(&conn, &params)?;
    state.notifier.task_created(&task);
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /api/tasks/{id}` — fetch one task.
#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    let conn = state.pool.get().map_err(StoreError::from)?;
    Ok(Json(TaskService::get_task(&conn, id)?))
}

/// `PUT /api/tasks/{id}` — partial update with change detection.
///
/// The update event is only broadcast when at least one field actually
/// changed; a no-op update returns the row silently.
#[instrument(skip(state, params))]
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<TaskUpdateParams>,
) -> Result<Json<Task>, ApiError> {
    let conn = state.pool.get().map_err(StoreError::from)?;
    let outcome = TaskService::update_task(&conn, id, &params)?;
    if !outcome.changed_fields.is_empty() {
        state
            .notifier
            .task_updated(&outcome.task, &outcome.previous, &outcome.changed_fields);
    }
    Ok(Json(outcome.task))
}

/// `DELETE /api/tasks/{id}` — delete a task and announce its final state.
#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = state.pool.get().map_err(StoreError::from)?;
    let task = TaskService::delete_task(&conn, id)?;
    state.notifier.task_deleted(&task);
    Ok(StatusCode::NO_CONTENT)
}
