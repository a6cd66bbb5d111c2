//! # taskboard-settings
//!
//! Configuration management with layered sources for the taskboard backend.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`Settings::default()`]
//! 2. **JSON file** — optional path passed to [`load_settings_from_path`];
//!    partial files are fine, missing fields keep their defaults
//! 3. **Environment variables** — `TASKBOARD_*` overrides (highest priority)
//!
//! There is no global singleton: the server binary loads settings once at
//! startup and injects them into application state.

pub mod errors;
pub mod types;

pub use errors::{Result, SettingsError};
pub use types::*;

use std::path::Path;

/// Load settings from defaults + environment overrides (no file layer).
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings.validate();
    settings
}

/// Load settings from a JSON file, then apply environment overrides.
///
/// The file may be partial: any field missing from the JSON keeps its
/// compiled default. A missing file is an error — callers that want
/// file-optional behavior should check existence first.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let raw = std::fs::read_to_string(path)?;
    let mut settings: Settings = serde_json::from_str(&raw)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Apply `TASKBOARD_*` environment variable overrides in place.
///
/// Unparseable values are logged and skipped rather than rejected, so a
/// stray variable never prevents startup.
fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(host) = std::env::var("TASKBOARD_HOST") {
        settings.server.host = host;
    }
    override_parsed("TASKBOARD_PORT", &mut settings.server.port);
    if let Ok(path) = std::env::var("TASKBOARD_DATABASE_PATH") {
        settings.database.path = path.into();
    }
    override_parsed("TASKBOARD_DATABASE_POOL_SIZE", &mut settings.database.pool_size);
    override_parsed(
        "TASKBOARD_SSE_HEARTBEAT_INTERVAL_SECS",
        &mut settings.sse.heartbeat_interval_secs,
    );
    override_parsed(
        "TASKBOARD_SSE_CLEANUP_INTERVAL_SECS",
        &mut settings.sse.cleanup_interval_secs,
    );
    override_parsed("TASKBOARD_SSE_MAX_CONNECTIONS", &mut settings.sse.max_connections);
}

fn override_parsed<T: std::str::FromStr>(var: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!(var, raw, "ignoring unparseable env override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.sse.heartbeat_interval_secs, 30);
        assert_eq!(s.sse.cleanup_interval_secs, 30);
        assert_eq!(s.sse.max_connections, 100);
        assert_eq!(s.pagination.default_page_size, 12);
        assert_eq!(s.pagination.max_page_size, 100);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"server": {{"port": 9100}}, "sse": {{"maxConnections": 5}}}}"#).unwrap();

        let s = load_settings_from_path(file.path()).unwrap();
        assert_eq!(s.server.port, 9100);
        assert_eq!(s.sse.max_connections, 5);
        // Untouched sections keep their defaults
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.sse.heartbeat_interval_secs, 30);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_settings_from_path(Path::new("/nonexistent/settings.json"));
        assert!(matches!(err, Err(SettingsError::Io(_))));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_settings_from_path(file.path());
        assert!(matches!(err, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn validate_clamps_zero_intervals() {
        let mut s = Settings::default();
        s.sse.heartbeat_interval_secs = 0;
        s.sse.cleanup_interval_secs = 0;
        s.validate();
        assert_eq!(s.sse.heartbeat_interval_secs, 1);
        assert_eq!(s.sse.cleanup_interval_secs, 1);
    }

    #[test]
    fn validate_corrects_page_size_inversion() {
        let mut s = Settings::default();
        s.pagination.default_page_size = 500;
        s.validate();
        assert!(s.pagination.default_page_size <= s.pagination.max_page_size);
    }

    #[test]
    fn settings_round_trip_json() {
        let s = Settings::default();
        let json = serde_json::to_string(&s).unwrap();
        // camelCase wire format
        assert!(json.contains("heartbeatIntervalSecs"));
        assert!(json.contains("allowedOrigins"));
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, s.server.port);
    }
}
