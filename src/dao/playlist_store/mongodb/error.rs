use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB playlist backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to list playlists of author `{author_id}`")]
    ListPlaylists {
        author_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert playlist `{id}`")]
    InsertPlaylist {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to update playlist `{id}`")]
    UpdatePlaylist {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete playlist `{id}`")]
    DeletePlaylist {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("stored playlist `{id}` is malformed: {reason}")]
    MalformedDocument { id: String, reason: String },
}
