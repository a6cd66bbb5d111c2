//! # taskboard-server
//!
//! HTTP surface for the taskboard backend: task CRUD under `/api/tasks`,
//! the real-time stream at `/api/sse/tasks`, plus `/health` and `/metrics`.
//!
//! The router is assembled from injected [`AppState`] so integration tests
//! can drive it in-process with `tower::ServiceExt::oneshot` against a
//! temporary database.

pub mod errors;
pub mod metrics;
pub mod routes;
pub mod state;

pub use state::AppState;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router around shared state.
pub fn router(state: AppState) -> Router {
    let origins: Vec<_> = state
        .settings
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/metrics", get(metrics::render_metrics))
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/api/tasks/counts", get(routes::tasks::task_counts))
        .route(
            "/api/tasks/{id}",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/api/sse/tasks", get(routes::stream::task_events))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
