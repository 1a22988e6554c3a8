use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    dao::{models::PlaylistEntity, playlist_store::PlaylistStore, storage::StorageResult},
    state::ids::UserId,
};

/// Playlist backend kept in process memory; used when no database is configured.
#[derive(Clone, Default)]
pub struct InMemoryPlaylistStore {
    playlists: Arc<RwLock<IndexMap<Uuid, PlaylistEntity>>>,
}

fn name_taken(
    playlists: &IndexMap<Uuid, PlaylistEntity>,
    author_id: UserId,
    name: &str,
    except: Option<Uuid>,
) -> bool {
    playlists.values().any(|playlist| {
        playlist.author_id == author_id && playlist.name == name && Some(playlist.id) != except
    })
}

impl PlaylistStore for InMemoryPlaylistStore {
    fn find_playlists(
        &self,
        author_id: UserId,
        name: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<PlaylistEntity>>> {
        let playlists = self.playlists.clone();
        Box::pin(async move {
            let guard = playlists.read().await;
            let mut found: Vec<PlaylistEntity> = guard
                .values()
                .filter(|playlist| playlist.author_id == author_id)
                .filter(|playlist| name.as_ref().is_none_or(|name| &playlist.name == name))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(found)
        })
    }

    fn insert_playlist(&self, playlist: PlaylistEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let playlists = self.playlists.clone();
        Box::pin(async move {
            let mut guard = playlists.write().await;
            if name_taken(&guard, playlist.author_id, &playlist.name, None) {
                return Ok(false);
            }
            guard.insert(playlist.id, playlist);
            Ok(true)
        })
    }

    fn delete_playlist(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let playlists = self.playlists.clone();
        Box::pin(async move { Ok(playlists.write().await.shift_remove(&id).is_some()) })
    }

    fn rename_playlist(&self, id: Uuid, name: String) -> BoxFuture<'static, StorageResult<bool>> {
        let playlists = self.playlists.clone();
        Box::pin(async move {
            let mut guard = playlists.write().await;
            let Some(author_id) = guard.get(&id).map(|playlist| playlist.author_id) else {
                return Ok(false);
            };
            if name_taken(&guard, author_id, &name, Some(id)) {
                return Ok(false);
            }
            let Some(playlist) = guard.get_mut(&id) else {
                return Ok(false);
            };
            playlist.name = name;
            playlist.updated_at = SystemTime::now();
            Ok(true)
        })
    }

    fn push_song(&self, id: Uuid, song: String) -> BoxFuture<'static, StorageResult<bool>> {
        let playlists = self.playlists.clone();
        Box::pin(async move {
            let mut guard = playlists.write().await;
            match guard.get_mut(&id) {
                Some(playlist) if !playlist.songs.contains(&song) => {
                    playlist.songs.push(song);
                    playlist.updated_at = SystemTime::now();
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn pull_song(&self, id: Uuid, song: String) -> BoxFuture<'static, StorageResult<bool>> {
        let playlists = self.playlists.clone();
        Box::pin(async move {
            let mut guard = playlists.write().await;
            let Some(playlist) = guard.get_mut(&id) else {
                return Ok(false);
            };
            let before = playlist.songs.len();
            playlist.songs.retain(|existing| existing != &song);
            let removed = playlist.songs.len() != before;
            if removed {
                playlist.updated_at = SystemTime::now();
            }
            Ok(removed)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
