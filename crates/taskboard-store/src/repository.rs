//! SQL repository for the tasks table.
//!
//! Plain persistence: no validation here, the service layer owns that.
//! Timestamps are stored as RFC 3339 text in UTC.

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::errors::Result;
use crate::types::{ListQuery, StatusCounts, Task, TaskStatus, TaskUpdateParams};

/// Static-method repository over a borrowed connection.
pub struct TaskRepository;

impl TaskRepository {
    /// Insert a task and return the stored row.
    pub fn create_task(
        conn: &Connection,
        title: &str,
        description: Option<&str>,
        status: TaskStatus,
    ) -> Result<Task> {
        let now = Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO tasks (title, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![title, description, status.as_sql(), now, now],
        )?;
        let id = conn.last_insert_rowid();
        Self::get_task(conn, id)?.ok_or_else(|| {
            // The row we just inserted vanished; surface as a query failure.
            crate::errors::StoreError::Database(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Fetch one task by id.
    pub fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
        let task = conn
            .query_row(
                "SELECT id, title, description, status, created_at, updated_at
                 FROM tasks WHERE id = ?1",
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// Apply a partial update. Returns the updated row, or `None` if the id
    /// does not exist. An empty update returns the current row untouched.
    pub fn update_task(
        conn: &Connection,
        id: i64,
        updates: &TaskUpdateParams,
    ) -> Result<Option<Task>> {
        if updates.is_empty() {
            return Self::get_task(conn, id);
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(ref title) = updates.title {
            sets.push("title = ?");
            args.push(Value::Text(title.clone()));
        }
        if let Some(ref description) = updates.description {
            sets.push("description = ?");
            // An empty string clears the column.
            if description.is_empty() {
                args.push(Value::Null);
            } else {
                args.push(Value::Text(description.clone()));
            }
        }
        if let Some(status) = updates.status {
            sets.push("status = ?");
            args.push(Value::Text(status.as_sql().to_string()));
        }
        sets.push("updated_at = ?");
        args.push(Value::Text(Utc::now().to_rfc3339()));
        args.push(Value::Integer(id));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));
        let changed = conn.execute(&sql, params_from_iter(args))?;
        if changed == 0 {
            return Ok(None);
        }
        Self::get_task(conn, id)
    }

    /// Delete a task. Returns whether a row existed.
    pub fn delete_task(conn: &Connection, id: i64) -> Result<bool> {
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// List one page of tasks plus the total row count for the filter.
    pub fn list_tasks(conn: &Connection, query: &ListQuery) -> Result<(Vec<Task>, u64)> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(status) = query.status {
            clauses.push("status = ?");
            args.push(Value::Text(status.as_sql().to_string()));
        }
        if let Some(ref needle) = query.title_contains {
            clauses.push("title LIKE ?");
            args.push(Value::Text(format!("%{needle}%")));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let total: u64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM tasks{where_clause}"),
            params_from_iter(args.clone()),
            |row| row.get::<_, i64>(0),
        )? as u64;

        // Column and direction come from closed enums, not client strings.
        let sql = format!(
            "SELECT id, title, description, status, created_at, updated_at
             FROM tasks{where_clause}
             ORDER BY {} {}
             LIMIT ? OFFSET ?",
            query.order_by.as_sql(),
            query.order_direction.as_sql(),
        );
        args.push(Value::Integer(i64::from(query.size)));
        args.push(Value::Integer(
            i64::from(query.page.saturating_sub(1)) * i64::from(query.size),
        ));

        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_from_iter(args), row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((tasks, total))
    }

    /// Per-status row counts plus the total.
    pub fn status_counts(conn: &Connection) -> Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        for row in rows {
            let (status, count) = row?;
            match TaskStatus::from_sql(&status) {
                Some(TaskStatus::Open) => counts.open = count,
                Some(TaskStatus::InProgress) => counts.in_progress = count,
                Some(TaskStatus::Done) => counts.done = count,
                // Unreachable while the CHECK constraint holds.
                None => continue,
            }
            counts.total += count;
        }
        Ok(counts)
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status_raw: String = row.get(3)?;
    let status = TaskStatus::from_sql(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown task status: {status_raw}").into(),
        )
    })?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status,
        created_at: parse_timestamp(row, 4)?,
        updated_at: parse_timestamp(row, 5)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
