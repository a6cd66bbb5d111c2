//! # taskboard-sse
//!
//! Real-time event broadcast core for the taskboard backend: connection
//! registry, per-client SSE streaming, and broadcast fan-out with heartbeat
//! and dead-connection cleanup.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `event` | Immutable event record + SSE wire encoding |
//! | `connection` | One subscriber's mailbox and liveness flag |
//! | `registry` | Live-connection map: add/remove/broadcast/reap |
//! | `stream` | Per-connection pull stream with guaranteed deregistration |
//! | `heartbeat` | Periodic heartbeat broadcast loop |
//! | `reaper` | Periodic dead-connection sweep loop |
//! | `hub` | Lifecycle owner: starts/stops both loops, closes everything |
//! | `notifier` | Trigger points the service layer calls after mutations |
//!
//! ## Data Flow
//!
//! A client opens a stream → `registry` creates a connection and hands its
//! id to `stream`, which pumps wire-encoded frames until the client goes
//! away. Separately, the service layer calls a `notifier` trigger point
//! after a committed mutation → `registry` fans the event out to every live
//! mailbox. Events are fire-and-forget: no replay, no delivery guarantee.

pub mod connection;
pub mod event;
pub mod heartbeat;
pub mod hub;
pub mod notifier;
pub mod reaper;
pub mod registry;
pub mod stream;

pub use connection::Connection;
pub use event::{EventKind, SseEvent};
pub use hub::{SseConfig, SseHub};
pub use notifier::TaskNotifier;
pub use registry::ConnectionRegistry;
pub use stream::connection_stream;
