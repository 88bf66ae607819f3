use std::sync::Arc;
use std::time::Duration;

use crate::registry::EntityRegistry;

/// Spawn a background tokio task that refreshes every registered entity
/// at the specified interval. One request per entity per cycle; the
/// interval itself is the only retry mechanism.
pub fn start_poller(registry: Arc<EntityRegistry>, poll_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(poll_interval_secs);
        loop {
            registry.refresh_all().await;
            tokio::time::sleep(interval).await;
        }
    });
}
