//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON wire
//! format and `#[serde(default)]` so partial files deserialize with the
//! compiled defaults filling the gaps.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type for the taskboard backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings schema version.
    pub version: String,
    /// Application name (used in logs and the health endpoint).
    pub name: String,
    /// HTTP server network settings.
    pub server: ServerSettings,
    /// SQLite database settings.
    pub database: DatabaseSettings,
    /// Real-time event stream settings.
    pub sse: SseSettings,
    /// Task list pagination defaults.
    pub pagination: PaginationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            name: "taskboard".to_string(),
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            sse: SseSettings::default(),
            pagination: PaginationSettings::default(),
        }
    }
}

impl Settings {
    /// Correct invalid values in place rather than rejecting them.
    ///
    /// Out-of-range values get clamped with a warning so users see corrected
    /// behavior instead of a startup failure.
    pub fn validate(&mut self) {
        if self.sse.heartbeat_interval_secs == 0 {
            tracing::warn!("sse.heartbeatIntervalSecs is 0, clamping to 1");
            self.sse.heartbeat_interval_secs = 1;
        }
        if self.sse.cleanup_interval_secs == 0 {
            tracing::warn!("sse.cleanupIntervalSecs is 0, clamping to 1");
            self.sse.cleanup_interval_secs = 1;
        }
        if self.database.pool_size == 0 {
            tracing::warn!("database.poolSize is 0, clamping to 1");
            self.database.pool_size = 1;
        }
        if self.pagination.default_page_size > self.pagination.max_page_size {
            tracing::warn!(
                default = self.pagination.default_page_size,
                max = self.pagination.max_page_size,
                "pagination defaultPageSize exceeds maxPageSize, correcting"
            );
            self.pagination.default_page_size = self.pagination.max_page_size;
        }
    }
}

/// HTTP server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// CORS allowed origins.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// SQLite database settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Database file path.
    pub path: PathBuf,
    /// Connection pool size.
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("taskboard.db"),
            pool_size: 10,
        }
    }
}

/// Real-time event stream settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SseSettings {
    /// Interval between heartbeat events, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Interval between dead-connection sweeps, in seconds.
    pub cleanup_interval_secs: u64,
    /// Soft cap on concurrently registered connections. When reached, the
    /// oldest connection is evicted to make room.
    pub max_connections: usize,
}

impl Default for SseSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            cleanup_interval_secs: 30,
            max_connections: 100,
        }
    }
}

/// Task list pagination defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationSettings {
    /// Page size when the client does not specify one.
    pub default_page_size: u32,
    /// Largest page size a client may request.
    pub max_page_size: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_page_size: 12,
            max_page_size: 100,
        }
    }
}
