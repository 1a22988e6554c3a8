//! Seams to the collaborators the engine drives but does not own: the chat UI,
//! the voice connection and the track resolver.

/// WebSocket-bridge implementation of the UI and voice transports.
pub mod gateway;
/// Lavalink REST implementation of [`TrackSource`].
pub mod lavalink;
#[cfg(test)]
pub(crate) mod testing;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use thiserror::Error;

use crate::state::{
    ids::{ChannelId, MessageId, SurfaceId, UserId},
    track::Track,
};

/// Result alias for UI and voice commands.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures while handing a command to the bridge.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No bridge is connected to receive the command.
    #[error("gateway bridge is not connected")]
    Disconnected,
    /// The outbound frame could not be serialized.
    #[error("failed to encode gateway frame")]
    Encode(#[source] serde_json::Error),
}

/// Chat-side rendering for one text channel.
///
/// Deletes are idempotent: deleting something already gone is not an error.
pub trait UiTransport: Send + Sync {
    /// Create a surface showing `content` with the given reactions attached.
    fn send_surface(
        &self,
        content: String,
        reactions: Vec<String>,
    ) -> BoxFuture<'static, TransportResult<SurfaceId>>;
    /// Replace the content of an existing surface.
    fn edit_surface(&self, surface: SurfaceId, content: String)
    -> BoxFuture<'static, TransportResult<()>>;
    /// Delete a surface if it still exists.
    fn delete_surface(&self, surface: SurfaceId) -> BoxFuture<'static, TransportResult<()>>;
    /// Delete a user message if it still exists.
    fn delete_message(&self, message: MessageId) -> BoxFuture<'static, TransportResult<()>>;
    /// Remove a user's reaction from a surface.
    fn remove_reaction(
        &self,
        surface: SurfaceId,
        emoji: String,
        user: UserId,
    ) -> BoxFuture<'static, TransportResult<()>>;
}

/// Voice connection of one group.
pub trait VoiceTransport: Send + Sync {
    /// Join (or move to) a voice channel.
    fn connect(&self, channel: ChannelId) -> BoxFuture<'static, TransportResult<()>>;
    /// Start streaming a track, replacing whatever plays.
    fn play(&self, track: Track) -> BoxFuture<'static, TransportResult<()>>;
    /// Pause the current track.
    fn pause(&self) -> BoxFuture<'static, TransportResult<()>>;
    /// Resume a paused track.
    fn resume(&self) -> BoxFuture<'static, TransportResult<()>>;
    /// Stop the current track; the bridge answers with a track-ended event.
    fn stop(&self) -> BoxFuture<'static, TransportResult<()>>;
    /// Leave the voice channel.
    fn disconnect(&self) -> BoxFuture<'static, TransportResult<()>>;
}

/// Failures reported by the track resolver.
#[derive(Debug, Error)]
pub enum TrackSourceError {
    /// Building the HTTP client failed.
    #[error("failed to build audio node client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent.
    #[error("failed to send audio node request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The node answered with an unexpected status.
    #[error("unexpected audio node response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// The response body was not valid JSON.
    #[error("failed to decode audio node response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The JSON payload did not match the expected shape.
    #[error("failed to deserialize audio node payload for `{identifier}`")]
    DeserializeValue {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },
    /// The node could not load the identifier.
    #[error("audio node failed to load `{identifier}`: {message}")]
    LoadFailed { identifier: String, message: String },
}

/// Resolves search queries and stored identifiers into playable tracks.
pub trait TrackSource: Send + Sync {
    /// Search for tracks; an empty list means nothing matched.
    fn search(&self, query: String) -> BoxFuture<'static, Result<Vec<Track>, TrackSourceError>>;
    /// Resolve a stored content identifier back into a track.
    fn resolve_by_id(
        &self,
        content_id: String,
    ) -> BoxFuture<'static, Result<Option<Track>, TrackSourceError>>;
}
