//! Authoritative in-memory set of live connections.
//!
//! The map is the only cross-task shared mutable state in the core. All map
//! access goes through a single `RwLock`: mutations (add/remove) take the
//! write lock, snapshot reads (broadcast, reap) take the read lock. Mailbox
//! sends happen outside the lock — each mailbox is its own channel and needs
//! no cross-connection coordination.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::counter;
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::Connection;
use crate::event::SseEvent;

/// Connections opened total (counter).
pub const SSE_CONNECTIONS_OPENED_TOTAL: &str = "sse_connections_opened_total";
/// Connections removed total (counter).
pub const SSE_CONNECTIONS_REMOVED_TOTAL: &str = "sse_connections_removed_total";
/// Oldest-connection evictions at the soft cap (counter).
pub const SSE_CONNECTIONS_EVICTED_TOTAL: &str = "sse_connections_evicted_total";
/// Failed mailbox sends during broadcast (counter).
pub const SSE_BROADCAST_DROPS_TOTAL: &str = "sse_broadcast_drops_total";

/// Registry of live connections, keyed by generated connection id.
pub struct ConnectionRegistry {
    /// Live connections indexed by connection id.
    connections: RwLock<HashMap<String, Arc<Connection>>>,
    /// Atomic counter tracking live connections (avoids read-locking for
    /// count queries from the heartbeat loop).
    active_count: AtomicUsize,
    /// Soft cap; 0 means unbounded.
    max_connections: usize,
}

impl ConnectionRegistry {
    /// Create a registry with the given soft connection cap (0 = unbounded).
    #[must_use]
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
            max_connections,
        }
    }

    /// Register a new connection and return its generated id. Never fails.
    ///
    /// At the soft cap the oldest connection (earliest `created_at`) is
    /// closed and evicted to make room.
    pub fn add(&self, user_agent: Option<String>) -> String {
        let id = Uuid::new_v4().to_string();
        let connection = Arc::new(Connection::new(id.clone(), user_agent));

        let mut conns = self.connections.write();
        if self.max_connections > 0 && conns.len() >= self.max_connections {
            let oldest = conns
                .values()
                .min_by_key(|c| c.created_at())
                .map(|c| c.id().to_string());
            if let Some(oldest_id) = oldest {
                if let Some(evicted) = conns.remove(&oldest_id) {
                    evicted.close();
                    let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                    counter!(SSE_CONNECTIONS_EVICTED_TOTAL).increment(1);
                    warn!(
                        connection_id = %oldest_id,
                        cap = self.max_connections,
                        "connection cap reached, evicted oldest connection"
                    );
                }
            }
        }
        if conns.insert(id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
        drop(conns);

        counter!(SSE_CONNECTIONS_OPENED_TOTAL).increment(1);
        info!(connection_id = %id, "sse connection added");
        id
    }

    /// Look up a connection by id.
    pub fn get(&self, connection_id: &str) -> Option<Arc<Connection>> {
        self.connections.read().get(connection_id).cloned()
    }

    /// Close and delete a connection. Returns whether it existed.
    ///
    /// Idempotent: removing an absent id is a no-op returning false.
    pub fn remove(&self, connection_id: &str) -> bool {
        let removed = self.connections.write().remove(connection_id);
        match removed {
            Some(connection) => {
                connection.close();
                let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                counter!(SSE_CONNECTIONS_REMOVED_TOTAL).increment(1);
                info!(connection_id, "sse connection removed");
                true
            }
            None => false,
        }
    }

    /// Fan one event out to every currently-known connection.
    ///
    /// Encodes the event once and shares the frame. Operates on a snapshot
    /// of the map taken under the read lock — connections added mid-pass may
    /// or may not receive the event. Connections whose send fails are marked
    /// dead and removed after the pass completes. Returns the number of
    /// successful sends.
    pub fn broadcast(&self, event: &SseEvent) -> usize {
        let snapshot: Vec<Arc<Connection>> = self.connections.read().values().cloned().collect();
        if snapshot.is_empty() {
            debug!(kind = %event.kind, "no active connections to broadcast to");
            return 0;
        }

        let frame = event.to_wire();
        let mut sent = 0usize;
        let mut failed: Vec<String> = Vec::new();
        for connection in &snapshot {
            if connection.send(frame.clone()) {
                sent += 1;
            } else {
                failed.push(connection.id().to_string());
            }
        }

        if !failed.is_empty() {
            counter!(SSE_BROADCAST_DROPS_TOTAL).increment(failed.len() as u64);
            for id in &failed {
                let _ = self.remove(id);
            }
        }
        debug!(kind = %event.kind, recipients = sent, "broadcast event");
        sent
    }

    /// Evict every connection whose liveness flag has dropped.
    ///
    /// Returns the number removed. Used by the reaper loop and safe to call
    /// concurrently with broadcasts.
    pub fn reap_dead(&self) -> usize {
        let dead: Vec<String> = self
            .connections
            .read()
            .values()
            .filter(|c| !c.is_alive())
            .map(|c| c.id().to_string())
            .collect();

        let mut removed = 0usize;
        for id in &dead {
            if self.remove(id) {
                removed += 1;
            }
        }
        removed
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Close every connection and clear the map. Used at shutdown.
    pub fn close_all(&self) {
        let drained: Vec<Arc<Connection>> = {
            let mut conns = self.connections.write();
            conns.drain().map(|(_, c)| c).collect()
        };
        for connection in &drained {
            connection.close();
        }
        self.active_count.store(0, Ordering::Relaxed);
        if !drained.is_empty() {
            info!(closed = drained.len(), "closed all sse connections");
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(0)
    }
}
