use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::dao::{
    playlist_store::{PlaylistStore, StoreSlot},
    storage::StorageError,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect the playlist backend, then watch its health and flip the slot into
/// degraded mode while it is unreachable.
pub async fn run<F, Fut>(slot: Arc<StoreSlot>, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn PlaylistStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                slot.install(store.clone()).await;
                info!("playlist storage connected; leaving degraded mode");
                delay = INITIAL_DELAY;

                if !watch_health(&slot, store.as_ref()).await {
                    warn!("exhausted playlist storage reconnect attempts; staying in degraded mode");
                    slot.clear().await;
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "playlist storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the backend until it stays unreachable after every reconnect attempt.
async fn watch_health(slot: &StoreSlot, store: &dyn PlaylistStore) -> bool {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if slot.is_degraded() {
                    info!("playlist storage healthy again; leaving degraded mode");
                    slot.update_degraded(false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "playlist storage health check failed");
                if !reconnect(slot, store).await {
                    return false;
                }
                slot.update_degraded(false);
                sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}

async fn reconnect(slot: &StoreSlot, store: &dyn PlaylistStore) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "playlist storage reconnected after a failed health check");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "playlist storage reconnect failed; entering degraded mode"
                    );
                    slot.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "playlist storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }
    false
}
