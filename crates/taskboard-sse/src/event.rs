//! Event record and SSE wire encoding.
//!
//! An [`SseEvent`] is immutable once constructed: the broadcast path encodes
//! it exactly once and shares the encoded frame (`Bytes`) across every
//! connection's mailbox. The payload is opaque to this crate — it is JSON
//! that gets line-framed, never inspected.

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Kind of a pushed event. Closed set — extend only by adding cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A task was created.
    TaskCreated,
    /// A task was updated.
    TaskUpdated,
    /// A task was deleted.
    TaskDeleted,
    /// First event on every stream, carries the connection id.
    ConnectionEstablished,
    /// Periodic liveness signal for idle streams.
    Heartbeat,
}

impl EventKind {
    /// Wire string representation (the `event:` field value).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskUpdated => "task_updated",
            Self::TaskDeleted => "task_deleted",
            Self::ConnectionEstablished => "connection_established",
            Self::Heartbeat => "heartbeat",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable notification record pushed to subscribed clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseEvent {
    /// Event kind (the `event:` wire field).
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// Opaque JSON payload (the `data:` wire field).
    pub data: Value,
    /// Opaque id clients may use for de-duplication. Purely advisory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Advisory reconnect delay in milliseconds (the `retry:` wire field).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Construct an event with a fresh random id and no retry hint.
    #[must_use]
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self {
            kind,
            data,
            id: Some(Uuid::new_v4().to_string()),
            retry: None,
        }
    }

    /// Set the advisory reconnect delay.
    #[must_use]
    pub fn with_retry(mut self, retry_ms: u64) -> Self {
        self.retry = Some(retry_ms);
        self
    }

    /// The greeting event sent as the first item on every stream.
    #[must_use]
    pub fn connection_established(connection_id: &str) -> Self {
        Self::new(
            EventKind::ConnectionEstablished,
            json!({
                "connection_id": connection_id,
                "timestamp": Utc::now().to_rfc3339(),
                "message": "SSE connection established",
            }),
        )
    }

    /// A periodic liveness event carrying the current connection count.
    #[must_use]
    pub fn heartbeat(active_connections: usize) -> Self {
        Self::new(
            EventKind::Heartbeat,
            json!({
                "timestamp": Utc::now().to_rfc3339(),
                "active_connections": active_connections,
            }),
        )
    }

    /// Encode to the SSE wire format.
    ///
    /// Lines in field order when present: `id:`, `event:`, one `data:` line
    /// per payload-JSON line, `retry:`, then a blank line twice — the frame
    /// always ends `\n\n`, which is the event boundary for client parsers.
    /// JSON cannot contain a raw newline, so the payload split is the only
    /// framing concern.
    #[must_use]
    pub fn to_wire(&self) -> Bytes {
        let mut lines: Vec<String> = Vec::with_capacity(6);
        if let Some(ref id) = self.id {
            lines.push(format!("id: {id}"));
        }
        lines.push(format!("event: {}", self.kind));
        for piece in self.data.to_string().split('\n') {
            lines.push(format!("data: {piece}"));
        }
        if let Some(retry) = self.retry {
            lines.push(format!("retry: {retry}"));
        }
        lines.push(String::new());
        lines.push(String::new());
        Bytes::from(lines.join("\n"))
    }
}
