use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{DateTime, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::{open_database, ping},
    error::{MongoDaoError, MongoResult},
    models::{MongoPlaylistDocument, author_filter, doc_id},
};
use crate::{
    dao::{models::PlaylistEntity, playlist_store::PlaylistStore, storage::StorageResult},
    state::ids::UserId,
};

const PLAYLIST_COLLECTION_NAME: &str = "playlists";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Playlist backend persisting to MongoDB.
#[derive(Clone)]
pub struct MongoPlaylistStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();
        ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = open_database(&self.config).await?;
        self.state.write().await.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl MongoPlaylistStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = IndexModel::builder()
            .keys(doc! { "author_id": 1, "name": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("playlist_author_name_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYLIST_COLLECTION_NAME,
                index: "author_id,name",
                source,
            })?;
        Ok(())
    }

    async fn collection(&self) -> Collection<MongoPlaylistDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoPlaylistDocument>(PLAYLIST_COLLECTION_NAME)
    }

    async fn find_playlists(
        &self,
        author_id: UserId,
        name: Option<String>,
    ) -> MongoResult<Vec<PlaylistEntity>> {
        let collection = self.collection().await;
        let list_error = |source| MongoDaoError::ListPlaylists {
            author_id: author_id.to_string(),
            source,
        };

        let documents: Vec<MongoPlaylistDocument> = collection
            .find(author_filter(author_id, name.as_deref()))
            .sort(doc! { "name": 1 })
            .await
            .map_err(list_error)?
            .try_collect()
            .await
            .map_err(list_error)?;

        documents.into_iter().map(PlaylistEntity::try_from).collect()
    }

    async fn insert_playlist(&self, playlist: PlaylistEntity) -> MongoResult<bool> {
        let id = playlist.id;
        let document: MongoPlaylistDocument = playlist.into();
        match self.collection().await.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => {
                debug!(%id, "playlist name already taken");
                Ok(false)
            }
            Err(source) => Err(MongoDaoError::InsertPlaylist { id, source }),
        }
    }

    async fn delete_playlist(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeletePlaylist { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn rename_playlist(&self, id: Uuid, name: String) -> MongoResult<bool> {
        let update = doc! { "$set": { "name": name, "updated_at": DateTime::now() } };
        match self.collection().await.update_one(doc_id(id), update).await {
            Ok(result) => Ok(result.matched_count > 0),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::UpdatePlaylist { id, source }),
        }
    }

    async fn push_song(&self, id: Uuid, song: String) -> MongoResult<bool> {
        let mut filter = doc_id(id);
        filter.insert("songs", doc! { "$ne": song.as_str() });
        let update = doc! {
            "$push": { "songs": song.as_str() },
            "$set": { "updated_at": DateTime::now() },
        };
        let result = self
            .collection()
            .await
            .update_one(filter, update)
            .await
            .map_err(|source| MongoDaoError::UpdatePlaylist { id, source })?;
        Ok(result.modified_count > 0)
    }

    async fn pull_song(&self, id: Uuid, song: String) -> MongoResult<bool> {
        let mut filter = doc_id(id);
        filter.insert("songs", song.as_str());
        let update = doc! {
            "$pull": { "songs": song.as_str() },
            "$set": { "updated_at": DateTime::now() },
        };
        let result = self
            .collection()
            .await
            .update_one(filter, update)
            .await
            .map_err(|source| MongoDaoError::UpdatePlaylist { id, source })?;
        Ok(result.modified_count > 0)
    }
}

impl PlaylistStore for MongoPlaylistStore {
    fn find_playlists(
        &self,
        author_id: UserId,
        name: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<PlaylistEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_playlists(author_id, name)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_playlist(&self, playlist: PlaylistEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_playlist(playlist).await.map_err(Into::into) })
    }

    fn delete_playlist(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_playlist(id).await.map_err(Into::into) })
    }

    fn rename_playlist(&self, id: Uuid, name: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.rename_playlist(id, name).await.map_err(Into::into) })
    }

    fn push_song(&self, id: Uuid, song: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.push_song(id, song).await.map_err(Into::into) })
    }

    fn pull_song(&self, id: Uuid, song: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.pull_song(id, song).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
