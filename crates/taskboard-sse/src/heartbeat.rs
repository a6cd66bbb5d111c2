//! Heartbeat broadcast loop.
//!
//! Runs for the lifetime of the hub. Each interval, if at least one
//! connection is registered, broadcasts a `heartbeat` event carrying the
//! current timestamp and live-connection count. With zero connections no
//! event is constructed for that interval. A single pass never terminates
//! the loop; cancellation exits within one wait slice.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::SseEvent;
use crate::registry::ConnectionRegistry;

/// Run the heartbeat loop until the token is cancelled.
pub async fn run(
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => heartbeat_pass(&registry),
        }
    }
    debug!("heartbeat loop stopped");
}

fn heartbeat_pass(registry: &ConnectionRegistry) {
    let active = registry.count();
    if active == 0 {
        return;
    }
    let sent = registry.broadcast(&SseEvent::heartbeat(active));
    debug!(active, sent, "heartbeat broadcast");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_heartbeat_each_interval_with_connections() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let id = registry.add(None);
        let mut rx = registry.get(&id).unwrap().take_mailbox().unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            Duration::from_secs(30),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(31)).await;
        let frame = rx.try_recv().unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.contains("event: heartbeat"));
        assert!(text.contains("active_connections"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_ok());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn no_heartbeat_with_zero_connections() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            Duration::from_secs(30),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(95)).await;
        // Add a connection afterwards: its mailbox must be empty — no
        // heartbeat was constructed while the registry was empty.
        let id = registry.add(None);
        let mut rx = registry.get(&id).unwrap().take_mailbox().unwrap();
        assert!(rx.try_recv().is_err());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_exits_promptly() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            Duration::from_secs(3600),
            cancel.clone(),
        ));

        cancel.cancel();
        handle.await.unwrap();
    }
}
