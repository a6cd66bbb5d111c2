//! Shared application state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use taskboard_settings::Settings;
use taskboard_sse::{SseHub, TaskNotifier};
use taskboard_store::TaskPool;

/// State injected into every route handler.
///
/// Everything here is cheaply cloneable: the pool and metrics handle clone
/// by reference internally, the rest is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Task database pool.
    pub pool: TaskPool,
    /// Real-time broadcast hub.
    pub hub: Arc<SseHub>,
    /// Trigger points for task mutation events.
    pub notifier: TaskNotifier,
    /// Loaded settings.
    pub settings: Arc<Settings>,
    /// Prometheus render handle for the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Assemble state around an already-started hub and open pool.
    #[must_use]
    pub fn new(
        pool: TaskPool,
        hub: Arc<SseHub>,
        settings: Arc<Settings>,
        metrics: PrometheusHandle,
    ) -> Self {
        let notifier = TaskNotifier::new(Arc::clone(hub.registry()));
        Self {
            pool,
            hub,
            notifier,
            settings,
            metrics,
        }
    }
}
