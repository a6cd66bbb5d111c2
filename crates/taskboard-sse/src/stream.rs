//! Per-connection stream endpoint.
//!
//! Converts one connection's mailbox into a pull-based sequence of
//! wire-encoded frames. The loop polls the mailbox with a bounded wait so it
//! can re-check the liveness flag promptly — the timeout is cooperative
//! cancellation, not an error. A drop guard deregisters the connection on
//! every exit path, including the client hanging up mid-stream.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use bytes::Bytes;
use futures::Stream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::event::SseEvent;
use crate::registry::ConnectionRegistry;

/// Bounded mailbox wait between liveness re-checks.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Deregisters the connection when the stream ends or is dropped.
struct StreamGuard {
    registry: Arc<ConnectionRegistry>,
    connection_id: String,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let _ = self.registry.remove(&self.connection_id);
        debug!(connection_id = %self.connection_id, "sse stream ended");
    }
}

/// Stream of wire-encoded frames for one registered connection.
///
/// An unknown id yields an empty stream that ends immediately — not an
/// error. Otherwise the first frame is a `connection_established` event
/// carrying the connection id; subsequent frames are whatever broadcasts
/// land in the mailbox, in FIFO order. Whatever ends the stream, the
/// connection is removed from the registry.
pub fn connection_stream(
    registry: Arc<ConnectionRegistry>,
    connection_id: String,
) -> impl Stream<Item = Bytes> + Send + 'static {
    stream! {
        let Some(connection) = registry.get(&connection_id) else {
            warn!(connection_id, "stream requested for unknown connection");
            return;
        };
        let Some(mut mailbox) = connection.take_mailbox() else {
            warn!(connection_id, "connection mailbox already claimed");
            return;
        };
        let _guard = StreamGuard {
            registry: Arc::clone(&registry),
            connection_id: connection_id.clone(),
        };

        // First item the client receives, enqueued ahead of any broadcast
        // that lands after this point.
        let _ = connection.send(SseEvent::connection_established(&connection_id).to_wire());

        loop {
            if !connection.is_alive() {
                break;
            }
            match timeout(POLL_INTERVAL, mailbox.recv()).await {
                Ok(Some(frame)) => yield frame,
                // Sender side gone: the connection was dropped from the map.
                Ok(None) => break,
                // Poll timeout: loop to re-check liveness.
                Err(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    use crate::event::EventKind;

    fn text(frame: &Bytes) -> &str {
        std::str::from_utf8(frame).unwrap()
    }

    #[tokio::test]
    async fn unknown_id_yields_empty_stream() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let mut stream = Box::pin(connection_stream(Arc::clone(&registry), "ghost".into()));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn first_frame_is_connection_established() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let id = registry.add(None);
        let mut stream = Box::pin(connection_stream(Arc::clone(&registry), id.clone()));

        let first = stream.next().await.unwrap();
        assert!(text(&first).contains("event: connection_established"));
        assert!(text(&first).contains(&id));
    }

    #[tokio::test]
    async fn broadcasts_arrive_after_greeting_in_order() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let id = registry.add(None);
        let mut stream = Box::pin(connection_stream(Arc::clone(&registry), id));

        let greeting = stream.next().await.unwrap();
        assert!(text(&greeting).contains("connection_established"));

        let _ = registry.broadcast(&SseEvent::new(EventKind::TaskCreated, json!({"task": {"id": 7}})));
        let _ = registry.broadcast(&SseEvent::new(EventKind::TaskUpdated, json!({"task": {"id": 7}})));

        let a = stream.next().await.unwrap();
        let b = stream.next().await.unwrap();
        assert!(text(&a).contains("event: task_created"));
        assert!(text(&b).contains("event: task_updated"));
    }

    #[tokio::test]
    async fn dropping_stream_deregisters_connection() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let id = registry.add(None);
        let mut stream = Box::pin(connection_stream(Arc::clone(&registry), id.clone()));
        let _ = stream.next().await.unwrap();
        assert_eq!(registry.count(), 1);

        drop(stream);
        assert_eq!(registry.count(), 0);
        assert!(registry.get(&id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_connection_ends_stream_within_one_poll_slice() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let id = registry.add(None);
        let connection = registry.get(&id).unwrap();
        let mut stream = Box::pin(connection_stream(Arc::clone(&registry), id.clone()));
        let _ = stream.next().await.unwrap();

        connection.close();
        // Paused clock auto-advances through the poll timeout.
        assert!(stream.next().await.is_none());
        assert!(registry.get(&id).is_none());
    }

    #[tokio::test]
    async fn second_stream_for_same_connection_is_empty() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let id = registry.add(None);
        let mut first = Box::pin(connection_stream(Arc::clone(&registry), id.clone()));
        let _ = first.next().await.unwrap();

        let mut second = Box::pin(connection_stream(Arc::clone(&registry), id));
        assert!(second.next().await.is_none());
    }
}
