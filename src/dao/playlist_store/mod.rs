/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    dao::{models::PlaylistEntity, storage::StorageResult},
    error::ServiceError,
    state::ids::UserId,
};

/// Primitive persistence operations for playlists.
///
/// Mutations report `false` instead of failing when they would break an
/// invariant (duplicate name, duplicate song, missing target).
pub trait PlaylistStore: Send + Sync {
    /// An author's playlists ordered by name, optionally restricted to one name.
    fn find_playlists(
        &self,
        author_id: UserId,
        name: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<PlaylistEntity>>>;
    /// Insert a playlist; `false` when the author already has one with that name.
    fn insert_playlist(&self, playlist: PlaylistEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete a playlist; `false` when it does not exist.
    fn delete_playlist(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Rename a playlist; `false` when missing or when the name is taken.
    fn rename_playlist(&self, id: Uuid, name: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Append a song; `false` when already present or the playlist is missing.
    fn push_song(&self, id: Uuid, song: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a song; `false` when absent or the playlist is missing.
    fn pull_song(&self, id: Uuid, song: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Check the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Slot for the active playlist backend plus the degraded flag.
///
/// Starts degraded and empty until a backend is installed.
pub struct StoreSlot {
    store: RwLock<Option<Arc<dyn PlaylistStore>>>,
    degraded: watch::Sender<bool>,
}

impl Default for StoreSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreSlot {
    /// An empty, degraded slot.
    pub fn new() -> Self {
        let (degraded, _rx) = watch::channel(true);
        Self {
            store: RwLock::new(None),
            degraded,
        }
    }

    /// The installed backend, if any.
    pub async fn get(&self) -> Option<Arc<dyn PlaylistStore>> {
        self.store.read().await.as_ref().cloned()
    }

    /// The installed backend, unless missing or degraded.
    pub async fn require(&self) -> Result<Arc<dyn PlaylistStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.get().await.ok_or(ServiceError::Degraded)
    }

    /// Install a backend and leave degraded mode.
    pub async fn install(&self, store: Arc<dyn PlaylistStore>) {
        *self.store.write().await = Some(store);
        self.update_degraded(false);
    }

    /// Remove the backend and enter degraded mode.
    pub async fn clear(&self) {
        self.store.write().await.take();
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only on change.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
