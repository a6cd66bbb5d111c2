//! Real-time event stream endpoint.
//!
//! The wire frames are already encoded by the broadcast core, so the
//! response body is the raw byte stream — no re-encoding layer in between.
//! Deregistration is owned by the stream itself (it removes the connection
//! when dropped), so an abrupt client disconnect needs no handling here.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderMap, HeaderName};
use axum::response::IntoResponse;
use futures::StreamExt;
use taskboard_sse::connection_stream;
use tracing::info;

use crate::state::AppState;

/// `GET /api/sse/tasks` — subscribe to the task event stream.
pub async fn task_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    let connection_id = state.hub.registry().add(user_agent);
    info!(connection_id = %connection_id, "sse stream opened");

    let frames = connection_stream(Arc::clone(state.hub.registry()), connection_id)
        .map(Ok::<_, Infallible>);

    (
        [
            (CONTENT_TYPE, "text/event-stream; charset=utf-8"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
            // Disables proxy buffering so events reach the client promptly.
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(frames),
    )
}
