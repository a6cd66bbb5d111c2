//! Trigger points the service layer calls after a committed mutation.
//!
//! Each method builds the corresponding event and fans it out. Failures stop
//! here: a serialization problem or an empty registry is logged and
//! swallowed, never propagated back to the mutation path — the worst effect
//! of a core failure is a missed notification, never a failed CRUD response.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::event::{EventKind, SseEvent};
use crate::registry::ConnectionRegistry;

/// Broadcast trigger points for task mutations.
#[derive(Clone)]
pub struct TaskNotifier {
    registry: Arc<ConnectionRegistry>,
}

impl TaskNotifier {
    /// Create a notifier that broadcasts into the given registry.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Announce a created entity.
    pub fn task_created<T: Serialize>(&self, task: &T) {
        let Some(task_json) = to_value_logged(task) else {
            return;
        };
        self.emit(
            EventKind::TaskCreated,
            json!({
                "task": task_json,
                "timestamp": Utc::now().to_rfc3339(),
                "action": "created",
            }),
        );
    }

    /// Announce an updated entity, with its previous state and the fields
    /// that changed.
    pub fn task_updated<T: Serialize>(
        &self,
        task: &T,
        previous: &T,
        changed_fields: &Map<String, Value>,
    ) {
        let (Some(task_json), Some(previous_json)) =
            (to_value_logged(task), to_value_logged(previous))
        else {
            return;
        };
        self.emit(
            EventKind::TaskUpdated,
            json!({
                "task": task_json,
                "original_task": previous_json,
                "changed_fields": changed_fields,
                "timestamp": Utc::now().to_rfc3339(),
                "action": "updated",
            }),
        );
    }

    /// Announce a deleted entity.
    pub fn task_deleted<T: Serialize>(&self, task: &T) {
        let Some(task_json) = to_value_logged(task) else {
            return;
        };
        self.emit(
            EventKind::TaskDeleted,
            json!({
                "task": task_json,
                "timestamp": Utc::now().to_rfc3339(),
                "action": "deleted",
            }),
        );
    }

    fn emit(&self, kind: EventKind, data: Value) {
        let event = SseEvent::new(kind, data);
        let recipients = self.registry.broadcast(&event);
        debug!(kind = %kind, recipients, "task event broadcast");
    }
}

fn to_value_logged<T: Serialize>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            error!(error = %e, "failed to serialize entity for broadcast");
            None
        }
    }
}
