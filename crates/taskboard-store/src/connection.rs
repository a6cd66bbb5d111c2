//! Connection pool and schema bootstrap.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::errors::Result;

/// Pooled SQLite handle type.
pub type TaskPool = r2d2::Pool<SqliteConnectionManager>;
/// One checked-out pool connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'IN_PROGRESS', 'DONE')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);
";

/// Open (creating if needed) the task database and initialize the schema.
pub fn open_pool(path: &Path, pool_size: u32) -> Result<TaskPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(())
    });
    let pool = r2d2::Pool::builder()
        .max_size(pool_size.max(1))
        .build(manager)?;

    pool.get()?.execute_batch(SCHEMA)?;
    info!(path = %path.display(), pool_size, "task database ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir.path().join("tasks.db"), 2).unwrap();
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn status_check_constraint_rejects_unknown_values() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir.path().join("tasks.db"), 1).unwrap();
        let conn = pool.get().unwrap();
        let result = conn.execute(
            "INSERT INTO tasks (title, status, created_at, updated_at) VALUES ('x', 'BOGUS', '', '')",
            [],
        );
        assert!(result.is_err());
    }
}
