//! Lifecycle owner for the broadcast core.
//!
//! An [`SseHub`] is constructed explicitly at startup and injected wherever
//! stream endpoints or trigger points need it — there is no global
//! singleton. `start` spins up the heartbeat and reaper loops; `stop`
//! cancels both, waits for them, then closes and evicts every connection.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::ConnectionRegistry;

/// Tuning knobs for the broadcast core.
#[derive(Clone, Debug)]
pub struct SseConfig {
    /// Interval between heartbeat events.
    pub heartbeat_interval: Duration,
    /// Interval between dead-connection sweeps.
    pub cleanup_interval: Duration,
    /// Soft cap on registered connections (0 = unbounded); at the cap the
    /// oldest connection is evicted.
    pub max_connections: usize,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(30),
            max_connections: 100,
        }
    }
}

/// Background task handles held while the hub is running.
struct HubTasks {
    cancel: CancellationToken,
    heartbeat: JoinHandle<()>,
    reaper: JoinHandle<()>,
}

/// Owns the connection registry and its two background loops.
pub struct SseHub {
    registry: Arc<ConnectionRegistry>,
    config: SseConfig,
    tasks: Mutex<Option<HubTasks>>,
}

impl SseHub {
    /// Create a stopped hub with the given configuration.
    #[must_use]
    pub fn new(config: SseConfig) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(config.max_connections)),
            config,
            tasks: Mutex::new(None),
        }
    }

    /// The registry this hub owns.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Spin up the heartbeat and reaper loops. Idempotent: calling `start`
    /// while running is a no-op.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if tasks.is_some() {
            debug!("sse hub already running");
            return;
        }
        let cancel = CancellationToken::new();
        let heartbeat = tokio::spawn(crate::heartbeat::run(
            Arc::clone(&self.registry),
            self.config.heartbeat_interval,
            cancel.clone(),
        ));
        let reaper = tokio::spawn(crate::reaper::run(
            Arc::clone(&self.registry),
            self.config.cleanup_interval,
            cancel.clone(),
        ));
        *tasks = Some(HubTasks {
            cancel,
            heartbeat,
            reaper,
        });
        info!(
            heartbeat_interval_secs = self.config.heartbeat_interval.as_secs(),
            cleanup_interval_secs = self.config.cleanup_interval.as_secs(),
            "sse background tasks started"
        );
    }

    /// Cancel both loops, wait for them, then close every connection.
    ///
    /// After `stop` returns no further events are sent; a later `start`
    /// brings the hub back up.
    pub async fn stop(&self) {
        let tasks = self.tasks.lock().take();
        if let Some(tasks) = tasks {
            tasks.cancel.cancel();
            let _ = tasks.heartbeat.await;
            let _ = tasks.reaper.await;
        }
        self.registry.close_all();
        info!("sse hub stopped");
    }

    /// Whether the background loops are currently running.
    pub fn is_running(&self) -> bool {
        self.tasks.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SseConfig {
        SseConfig {
            heartbeat_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(30),
            max_connections: 10,
        }
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let hub = SseHub::new(test_config());
        hub.start();
        hub.start();
        assert!(hub.is_running());
        hub.stop().await;
        assert!(!hub.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let hub = SseHub::new(test_config());
        hub.stop().await;
        assert!(!hub.is_running());
    }

    #[tokio::test]
    async fn stop_closes_every_connection() {
        let hub = SseHub::new(test_config());
        hub.start();
        let id = hub.registry().add(None);
        let conn = hub.registry().get(&id).unwrap();

        hub.stop().await;
        assert_eq!(hub.registry().count(), 0);
        assert!(!conn.is_alive());
    }

    #[tokio::test]
    async fn hub_can_restart_after_stop() {
        let hub = SseHub::new(test_config());
        hub.start();
        hub.stop().await;
        hub.start();
        assert!(hub.is_running());
        hub.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn running_hub_emits_heartbeats() {
        let hub = SseHub::new(test_config());
        hub.start();
        let id = hub.registry().add(None);
        let mut rx = hub.registry().get(&id).unwrap().take_mailbox().unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        let frame = rx.try_recv().unwrap();
        assert!(std::str::from_utf8(&frame).unwrap().contains("event: heartbeat"));

        hub.stop().await;
    }
}
