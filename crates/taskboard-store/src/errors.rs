//! Store error types.

/// Errors produced by task persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No task with the given id.
    #[error("task {id} not found")]
    NotFound {
        /// The missing task id.
        id: i64,
    },

    /// Input failed validation before reaching SQL.
    #[error("{0}")]
    Validation(String),

    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool failure.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, StoreError>;
