//! HTTP error mapping.
//!
//! Store errors map onto status codes with a small JSON body:
//! `{"message": "...", "type": "..."}`. Validation problems are client
//! errors (422), missing rows are 404, everything touching SQLite or the
//! pool is a 500 with the detail kept out of the response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use taskboard_store::StoreError;
use tracing::error;

/// Error type returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure in the task store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let Self::Store(err) = self;
        let (status, kind, message) = match &err {
            StoreError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            StoreError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            StoreError::Database(_) | StoreError::Pool(_) => {
                error!(error = %err, "request failed on the task store");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error occurred".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message, "type": kind }))).into_response()
    }
}
