//! Playlist CRUD rules layered over the active [`PlaylistStore`].
//!
//! Outcomes that are the user's doing (duplicate name, missing playlist) come
//! back as a failed [`StoreResponse`] carrying the text to show; only backend
//! trouble is an error.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    dao::{
        models::PlaylistEntity,
        playlist_store::{PlaylistStore, StoreSlot},
        storage::StorageResult,
    },
    error::ServiceError,
    state::ids::UserId,
};

/// Per-author playlist limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistLimits {
    /// Most playlists one author may own.
    pub max_playlists: usize,
    /// Longest accepted name, in characters.
    pub max_name_len: usize,
}

/// Outcome of a playlist mutation, with the message to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    /// Whether the mutation happened.
    pub ok: bool,
    /// Text for the notifier.
    pub message: String,
}

impl StoreResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Service-level result of playlist operations.
pub type PlaylistResult<T> = Result<T, ServiceError>;

/// Playlist operations used by the conversation engine.
#[derive(Clone)]
pub struct PlaylistService {
    slot: Arc<StoreSlot>,
    limits: PlaylistLimits,
}

fn missing_playlist(name: &str) -> StoreResponse {
    StoreResponse::failed(format!("Playlist **{name}** does not exist."))
}

impl PlaylistService {
    /// Build a service over the shared store slot.
    pub fn new(slot: Arc<StoreSlot>, limits: PlaylistLimits) -> Self {
        Self { slot, limits }
    }

    fn sanitize_name(&self, name: &str) -> Result<String, StoreResponse> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreResponse::failed("Playlist name must not be empty."));
        }
        if name.chars().count() > self.limits.max_name_len {
            return Err(StoreResponse::failed(format!(
                "Playlist names are limited to {} characters.",
                self.limits.max_name_len
            )));
        }
        Ok(name.to_string())
    }

    async fn find_one(
        store: &Arc<dyn PlaylistStore>,
        author_id: UserId,
        name: &str,
    ) -> StorageResult<Option<PlaylistEntity>> {
        let found = store
            .find_playlists(author_id, Some(name.to_string()))
            .await?;
        Ok(found.into_iter().next())
    }

    /// Create an empty playlist.
    pub async fn create_playlist(
        &self,
        name: &str,
        author_id: UserId,
    ) -> PlaylistResult<StoreResponse> {
        let name = match self.sanitize_name(name) {
            Ok(name) => name,
            Err(response) => return Ok(response),
        };
        let store = self.slot.require().await?;

        if Self::find_one(&store, author_id, &name).await?.is_some() {
            return Ok(StoreResponse::failed(format!(
                "Playlist **{name}** already exists."
            )));
        }
        let owned = store.find_playlists(author_id, None).await?.len();
        if owned >= self.limits.max_playlists {
            debug!(%author_id, owned, "playlist cap reached");
            return Ok(StoreResponse::failed(
                "You have reached the maximum number of playlists.",
            ));
        }

        if !store
            .insert_playlist(PlaylistEntity::new(author_id, name.clone()))
            .await?
        {
            return Ok(StoreResponse::failed(format!(
                "Playlist **{name}** already exists."
            )));
        }
        info!(%author_id, playlist = %name, "playlist created");
        Ok(StoreResponse::ok(format!("Created playlist **{name}**.")))
    }

    /// Delete a playlist and its songs.
    pub async fn delete_playlist(
        &self,
        name: &str,
        author_id: UserId,
    ) -> PlaylistResult<StoreResponse> {
        let store = self.slot.require().await?;
        let Some(playlist) = Self::find_one(&store, author_id, name).await? else {
            return Ok(missing_playlist(name));
        };
        if !store.delete_playlist(playlist.id).await? {
            return Ok(missing_playlist(name));
        }
        info!(%author_id, playlist = %name, "playlist deleted");
        Ok(StoreResponse::ok(format!("Deleted playlist **{name}**.")))
    }

    /// Rename a playlist.
    pub async fn rename_playlist(
        &self,
        author_id: UserId,
        old_name: &str,
        new_name: &str,
    ) -> PlaylistResult<StoreResponse> {
        let new_name = match self.sanitize_name(new_name) {
            Ok(name) => name,
            Err(response) => return Ok(response),
        };
        let store = self.slot.require().await?;
        let Some(playlist) = Self::find_one(&store, author_id, old_name).await? else {
            return Ok(missing_playlist(old_name));
        };
        let taken = || StoreResponse::failed(format!("Playlist **{new_name}** already exists."));
        if playlist.name != new_name
            && Self::find_one(&store, author_id, &new_name).await?.is_some()
        {
            return Ok(taken());
        }
        if !store
            .rename_playlist(playlist.id, new_name.clone())
            .await?
        {
            return Ok(taken());
        }
        info!(%author_id, from = %old_name, to = %new_name, "playlist renamed");
        Ok(StoreResponse::ok(format!(
            "Renamed playlist from **{old_name}** to **{new_name}**."
        )))
    }

    /// An author's playlists ordered by name, optionally only the named one.
    pub async fn list_playlists(
        &self,
        author_id: UserId,
        name: Option<&str>,
    ) -> PlaylistResult<Vec<PlaylistEntity>> {
        let store = self.slot.require().await?;
        Ok(store
            .find_playlists(author_id, name.map(str::to_string))
            .await?)
    }

    /// Append a song to a playlist.
    pub async fn add_song(
        &self,
        author_id: UserId,
        playlist: &str,
        content_id: &str,
    ) -> PlaylistResult<StoreResponse> {
        let store = self.slot.require().await?;
        let Some(entity) = Self::find_one(&store, author_id, playlist).await? else {
            return Ok(missing_playlist(playlist));
        };
        if !store.push_song(entity.id, content_id.to_string()).await? {
            return Ok(StoreResponse::failed(format!(
                "Song already exists in **{playlist}**."
            )));
        }
        debug!(%author_id, %playlist, content_id, "song added");
        Ok(StoreResponse::ok(format!("Added song to **{playlist}**.")))
    }

    /// Remove a song from a playlist.
    pub async fn remove_song(
        &self,
        author_id: UserId,
        playlist: &str,
        content_id: &str,
    ) -> PlaylistResult<StoreResponse> {
        let missing_song =
            || StoreResponse::failed(format!("Song does not exist in playlist **{playlist}**."));
        let store = self.slot.require().await?;
        let Some(entity) = Self::find_one(&store, author_id, playlist).await? else {
            return Ok(missing_song());
        };
        if !store.pull_song(entity.id, content_id.to_string()).await? {
            return Ok(missing_song());
        }
        debug!(%author_id, %playlist, content_id, "song removed");
        Ok(StoreResponse::ok(format!("Deleted song from **{playlist}**.")))
    }

    /// Songs of a playlist in insertion order; empty when it does not exist.
    pub async fn list_songs(&self, author_id: UserId, playlist: &str) -> PlaylistResult<Vec<String>> {
        let store = self.slot.require().await?;
        Ok(Self::find_one(&store, author_id, playlist)
            .await?
            .map(|entity| entity.songs)
            .unwrap_or_default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dao::playlist_store::memory::InMemoryPlaylistStore;

    pub(crate) const LIMITS: PlaylistLimits = PlaylistLimits {
        max_playlists: 10,
        max_name_len: 30,
    };

    pub(crate) async fn memory_service() -> PlaylistService {
        let slot = Arc::new(StoreSlot::new());
        slot.install(Arc::new(InMemoryPlaylistStore::default())).await;
        PlaylistService::new(slot, LIMITS)
    }

    const AUTHOR: UserId = UserId(1);

    #[tokio::test]
    async fn road_trip() {
        let service = memory_service().await;

        let created = service.create_playlist("Road Trip", AUTHOR).await.unwrap();
        assert!(created.ok);
        assert_eq!(created.message, "Created playlist **Road Trip**.");

        let added = service.add_song(AUTHOR, "Road Trip", "abc").await.unwrap();
        assert_eq!(added.message, "Added song to **Road Trip**.");
        let again = service.add_song(AUTHOR, "Road Trip", "abc").await.unwrap();
        assert!(!again.ok);
        assert_eq!(again.message, "Song already exists in **Road Trip**.");

        assert_eq!(service.list_songs(AUTHOR, "Road Trip").await.unwrap(), ["abc"]);

        let renamed = service
            .rename_playlist(AUTHOR, "Road Trip", "Summer")
            .await
            .unwrap();
        assert_eq!(renamed.message, "Renamed playlist from **Road Trip** to **Summer**.");
        assert_eq!(service.list_songs(AUTHOR, "Summer").await.unwrap(), ["abc"]);
        assert!(service.list_songs(AUTHOR, "Road Trip").await.unwrap().is_empty());

        let deleted = service.delete_playlist("Summer", AUTHOR).await.unwrap();
        assert_eq!(deleted.message, "Deleted playlist **Summer**.");
        assert!(service.list_playlists(AUTHOR, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_are_trimmed_and_bounded() {
        let service = memory_service().await;
        let created = service.create_playlist("  Mix  ", AUTHOR).await.unwrap();
        assert_eq!(created.message, "Created playlist **Mix**.");

        let duplicate = service.create_playlist("Mix", AUTHOR).await.unwrap();
        assert_eq!(duplicate.message, "Playlist **Mix** already exists.");

        let empty = service.create_playlist("   ", AUTHOR).await.unwrap();
        assert_eq!(empty.message, "Playlist name must not be empty.");

        let long = service.create_playlist(&"x".repeat(31), AUTHOR).await.unwrap();
        assert_eq!(long.message, "Playlist names are limited to 30 characters.");
        assert!(service.create_playlist(&"x".repeat(30), AUTHOR).await.unwrap().ok);
    }

    #[tokio::test]
    async fn cap_is_inclusive() {
        let service = memory_service().await;
        for index in 0..LIMITS.max_playlists {
            assert!(service.create_playlist(&format!("p{index}"), AUTHOR).await.unwrap().ok);
        }
        let refused = service.create_playlist("one more", AUTHOR).await.unwrap();
        assert!(!refused.ok);
        assert_eq!(refused.message, "You have reached the maximum number of playlists.");
        // other authors are unaffected
        assert!(service.create_playlist("one more", UserId(2)).await.unwrap().ok);
    }

    #[tokio::test]
    async fn missing_targets_are_reported() {
        let service = memory_service().await;
        assert_eq!(
            service.delete_playlist("Nope", AUTHOR).await.unwrap().message,
            "Playlist **Nope** does not exist."
        );
        assert_eq!(
            service.rename_playlist(AUTHOR, "Nope", "Yes").await.unwrap().message,
            "Playlist **Nope** does not exist."
        );
        assert_eq!(
            service.add_song(AUTHOR, "Nope", "abc").await.unwrap().message,
            "Playlist **Nope** does not exist."
        );
        assert_eq!(
            service.remove_song(AUTHOR, "Nope", "abc").await.unwrap().message,
            "Song does not exist in playlist **Nope**."
        );

        service.create_playlist("Mix", AUTHOR).await.unwrap();
        assert_eq!(
            service.remove_song(AUTHOR, "Mix", "abc").await.unwrap().message,
            "Song does not exist in playlist **Mix**."
        );
    }

    #[tokio::test]
    async fn rename_refuses_an_existing_name() {
        let service = memory_service().await;
        service.create_playlist("A", AUTHOR).await.unwrap();
        service.create_playlist("B", AUTHOR).await.unwrap();
        let refused = service.rename_playlist(AUTHOR, "A", "B").await.unwrap();
        assert!(!refused.ok);
        assert_eq!(refused.message, "Playlist **B** already exists.");
    }

    #[tokio::test]
    async fn degraded_storage_is_an_error() {
        let service = PlaylistService::new(Arc::new(StoreSlot::new()), LIMITS);
        assert!(matches!(
            service.create_playlist("A", AUTHOR).await,
            Err(ServiceError::Degraded)
        ));
        assert!(matches!(
            service.list_playlists(AUTHOR, None).await,
            Err(ServiceError::Degraded)
        ));
    }
}
