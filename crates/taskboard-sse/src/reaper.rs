//! Dead-connection cleanup loop.
//!
//! Each interval, sweeps the registry for connections whose liveness flag
//! has dropped and evicts them. A zero-removal pass is normal and not
//! logged. Same failure/cancellation contract as the heartbeat loop: one
//! pass never kills the loop, cancellation exits within one wait slice.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::ConnectionRegistry;

/// Run the cleanup loop until the token is cancelled.
pub async fn run(
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => reap_pass(&registry),
        }
    }
    debug!("reaper loop stopped");
}

fn reap_pass(registry: &ConnectionRegistry) {
    let removed = registry.reap_dead();
    if removed > 0 {
        info!(removed, "cleaned up dead sse connections");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn dead_connections_are_evicted_within_one_interval() {
        let registry = Arc::new(ConnectionRegistry::new(0));
        let alive = registry.add(None);
        let dead = registry.add(None);
        registry.get(&dead).unwrap().close();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            Duration::from_secs(30),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(registry.get(&dead).is_none());
        assert!(registry.get(&alive).is_some());
        assert_eq!(registry.count(), 1);

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
