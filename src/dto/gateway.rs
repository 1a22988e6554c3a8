use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::state::{
    ids::{ChannelId, GroupId, Member, MessageId, SurfaceId, UserId},
    track::Track,
};

/// Version of the bridge protocol spoken on `/gateway`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Longest chat message the platform delivers.
pub const MAX_CONTENT_LEN: u64 = 2000;

/// Frames accepted from the chat bridge.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayInbound {
    /// First frame of every connection.
    Identification(IdentificationFrame),
    /// The bridge joined a group and created the dedicated text channel.
    Setup(SetupFrame),
    /// A user added a reaction to one of our surfaces.
    ReactionAdded(ReactionFrame),
    /// A user posted a message in a group's dedicated channel.
    MessageCreated(MessageFrame),
    /// The current track of a group finished or was stopped.
    TrackEnded(TrackEndedFrame),
}

/// Bridge identification payload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct IdentificationFrame {
    /// Free-form bridge name, for logs.
    #[validate(length(min = 1, max = 64))]
    pub bridge: String,
    /// Protocol version the bridge speaks.
    pub protocol_version: u32,
}

/// Group setup payload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct SetupFrame {
    /// Group being set up.
    pub group_id: GroupId,
    /// Dedicated text channel of the group.
    pub channel_id: ChannelId,
}

/// Reaction payload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ReactionFrame {
    /// Group the surface lives in.
    pub group_id: GroupId,
    /// Surface the reaction was added to.
    pub surface_id: SurfaceId,
    /// Reaction emoji.
    #[validate(length(min = 1, max = 64))]
    pub emoji: String,
    /// Reacting user.
    pub user: Member,
}

/// Chat message payload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct MessageFrame {
    /// Group the message was posted in.
    pub group_id: GroupId,
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Message identity, used to delete it.
    pub message_id: MessageId,
    /// Raw message text.
    #[validate(length(max = MAX_CONTENT_LEN))]
    pub content: String,
    /// Message author.
    pub author: Member,
}

/// Track-ended payload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct TrackEndedFrame {
    /// Group whose track ended.
    pub group_id: GroupId,
}

/// Reasons an inbound frame is rejected.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Not JSON, or not one of the known frames.
    #[error("malformed gateway frame: {0}")]
    Parse(#[from] serde_json::Error),
    /// Well-formed but out of bounds.
    #[error("invalid gateway frame: {0}")]
    Invalid(#[from] ValidationErrors),
}

impl GatewayInbound {
    /// Parse and validate a text frame.
    pub fn from_json_str(raw: &str) -> Result<Self, FrameError> {
        let frame: Self = serde_json::from_str(raw)?;
        match &frame {
            Self::Identification(payload) => payload.validate()?,
            Self::Setup(payload) => payload.validate()?,
            Self::ReactionAdded(payload) => payload.validate()?,
            Self::MessageCreated(payload) => payload.validate()?,
            Self::TrackEnded(payload) => payload.validate()?,
        }
        Ok(frame)
    }

    /// Group the frame targets, if it targets one.
    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            Self::Identification(_) => None,
            Self::Setup(payload) => Some(payload.group_id),
            Self::ReactionAdded(payload) => Some(payload.group_id),
            Self::MessageCreated(payload) => Some(payload.group_id),
            Self::TrackEnded(payload) => Some(payload.group_id),
        }
    }
}

/// Commands sent to the chat bridge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayOutbound {
    /// Answer to a valid identification.
    Welcome {
        protocol_version: u32,
        /// Name of the dedicated text channel the bridge should create per group.
        channel_name: String,
    },
    /// Post a new message with reactions attached.
    SendSurface {
        group_id: GroupId,
        channel_id: ChannelId,
        surface_id: SurfaceId,
        content: String,
        reactions: Vec<String>,
    },
    /// Edit a previously posted surface.
    EditSurface {
        group_id: GroupId,
        surface_id: SurfaceId,
        content: String,
    },
    /// Delete a previously posted surface.
    DeleteSurface {
        group_id: GroupId,
        surface_id: SurfaceId,
    },
    /// Delete a user message.
    DeleteMessage {
        group_id: GroupId,
        channel_id: ChannelId,
        message_id: MessageId,
    },
    /// Remove a user's reaction from a surface.
    RemoveReaction {
        group_id: GroupId,
        surface_id: SurfaceId,
        emoji: String,
        user_id: UserId,
    },
    /// Join a voice channel.
    VoiceConnect {
        group_id: GroupId,
        channel_id: ChannelId,
    },
    /// Stream a track.
    VoicePlay { group_id: GroupId, track: Track },
    /// Pause playback.
    VoicePause { group_id: GroupId },
    /// Resume playback.
    VoiceResume { group_id: GroupId },
    /// Stop the current track.
    VoiceStop { group_id: GroupId },
    /// Leave the voice channel.
    VoiceDisconnect { group_id: GroupId },
}
