//! # taskboard-store
//!
//! SQLite persistence for the tracked task entity, via `rusqlite` with an
//! `r2d2` connection pool.
//!
//! Layering follows repository/service: [`repository::TaskRepository`] is
//! plain SQL with row mapping, [`service::TaskService`] adds validation,
//! pagination limits, and change detection for update events. The real-time
//! core never calls into this crate — the service layer that owns both sides
//! invokes broadcast trigger points after a mutation commits here.

pub mod connection;
pub mod errors;
pub mod repository;
pub mod service;
pub mod types;

pub use connection::{PooledConnection, TaskPool, open_pool};
pub use errors::{Result, StoreError};
pub use repository::TaskRepository;
pub use service::{TaskService, UpdateOutcome};
pub use types::*;
