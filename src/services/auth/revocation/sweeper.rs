//! Background eviction of revocation entries past their natural expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::services::auth::revocation::RevocationStore;

/// Spawn a task that calls `evict_expired` every `period`.
///
/// Each sweep runs in its own task; a failed or panicking sweep is logged and
/// retried on the next tick.
pub fn spawn(store: Arc<dyn RevocationStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let sweep = tokio::spawn({
                let store = store.clone();
                async move { store.evict_expired(Utc::now()).await }
            });

            match sweep.await {
                Ok(Ok(0)) => {}
                Ok(Ok(evicted)) => tracing::debug!(
                    backend = store.backend_name(),
                    evicted,
                    remaining = ?store.len(),
                    "evicted expired revocations"
                ),
                Ok(Err(err)) => tracing::warn!(
                    backend = store.backend_name(),
                    error = %err,
                    "revocation sweep failed"
                ),
                Err(err) => tracing::error!(
                    backend = store.backend_name(),
                    error = %err,
                    "revocation sweep aborted"
                ),
            }
        }
    })
}
