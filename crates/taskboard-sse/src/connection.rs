//! One subscriber's mailbox.
//!
//! A `Connection` pairs an unbounded FIFO queue of pre-encoded frames with a
//! terminal liveness flag. Exactly two parties touch it: producers enqueue
//! via [`Connection::send`] (broadcast fan-out), and the single stream
//! endpoint drains it after claiming the receiver with
//! [`Connection::take_mailbox`].
//!
//! The mailbox is unbounded: a stalled client accumulates memory until it is
//! marked dead and reaped. Accepted design limit.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// Server-side representation of one subscribed client.
pub struct Connection {
    id: String,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    tx: mpsc::UnboundedSender<Bytes>,
    /// Receiver half, claimed once by the stream endpoint.
    rx: Mutex<Option<mpsc::UnboundedReceiver<Bytes>>>,
    /// Starts true; flips false on first failed send or explicit close.
    /// Never resets to true.
    alive: AtomicBool,
}

impl Connection {
    /// Create a connection with an empty mailbox.
    pub(crate) fn new(id: String, user_agent: Option<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            id,
            user_agent,
            created_at: Utc::now(),
            tx,
            rx: Mutex::new(Some(rx)),
            alive: AtomicBool::new(true),
        }
    }

    /// Stable identifier assigned at creation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Client user agent, informational only.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this connection can still accept frames.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Enqueue a frame. Returns whether the send succeeded.
    ///
    /// A failed send (receiver gone) marks the connection dead; the flag is
    /// terminal, so every later send returns false immediately.
    pub fn send(&self, frame: Bytes) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.tx.send(frame) {
            Ok(()) => true,
            Err(_) => {
                warn!(connection_id = %self.id, "failed to send event, marking connection dead");
                self.alive.store(false, Ordering::Relaxed);
                false
            }
        }
    }

    /// Mark the connection dead and discard any frames still queued.
    ///
    /// If the stream endpoint already claimed the receiver, it observes the
    /// flag within one poll slice and ends on its own.
    pub fn close(&self) {
        self.alive.store(false, Ordering::Relaxed);
        drop(self.rx.lock().take());
    }

    /// Claim the receiver half of the mailbox. Yields `Some` exactly once.
    pub(crate) fn take_mailbox(&self) -> Option<mpsc::UnboundedReceiver<Bytes>> {
        self.rx.lock().take()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[tokio::test]
    async fn send_delivers_in_fifo_order() {
        let conn = Connection::new("c1".into(), None);
        assert!(conn.send(frame("a")));
        assert!(conn.send(frame("b")));

        let mut rx = conn.take_mailbox().unwrap();
        assert_eq!(rx.recv().await.unwrap(), frame("a"));
        assert_eq!(rx.recv().await.unwrap(), frame("b"));
    }

    #[tokio::test]
    async fn mailbox_claimed_only_once() {
        let conn = Connection::new("c1".into(), None);
        assert!(conn.take_mailbox().is_some());
        assert!(conn.take_mailbox().is_none());
    }

    #[tokio::test]
    async fn send_after_receiver_drop_marks_dead() {
        let conn = Connection::new("c1".into(), None);
        drop(conn.take_mailbox().unwrap());

        assert!(!conn.send(frame("x")));
        assert!(!conn.is_alive());
        // Dead state is terminal
        assert!(!conn.send(frame("y")));
    }

    #[tokio::test]
    async fn close_is_terminal_and_drains() {
        let conn = Connection::new("c1".into(), None);
        assert!(conn.send(frame("pending")));
        conn.close();

        assert!(!conn.is_alive());
        assert!(!conn.send(frame("late")));
        // Receiver was dropped by close
        assert!(conn.take_mailbox().is_none());
    }

    #[tokio::test]
    async fn user_agent_is_preserved() {
        let conn = Connection::new("c1".into(), Some("curl/8".into()));
        assert_eq!(conn.user_agent(), Some("curl/8"));
    }
}
