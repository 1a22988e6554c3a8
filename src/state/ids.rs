//! Identifiers shared between the gateway wire format and the in-memory engine.
//!
//! Platform identifiers are 64-bit snowflakes carried as strings on the wire so
//! JavaScript bridges do not lose precision.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[serde_as]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        #[schema(value_type = String)]
        pub struct $name(
            #[serde_as(as = "DisplayFromStr")]
            pub u64,
        );

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

snowflake_id!(
    /// Identity of a chat user.
    UserId
);
snowflake_id!(
    /// Text or voice channel on the chat platform.
    ChannelId
);
snowflake_id!(
    /// Group ("server") owning one independent jukebox session.
    GroupId
);
snowflake_id!(
    /// A user-authored chat message.
    MessageId
);

impl UserId {
    /// Platform mention markup for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

/// UI surface (rendered message) created by the core.
///
/// Surface ids are allocated here rather than by the platform so creating a
/// surface never needs a round trip through the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SurfaceId(pub Uuid);

impl SurfaceId {
    /// Allocate a fresh surface identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Acting user as seen by the bridge when an event happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Member {
    /// User identity.
    pub id: UserId,
    /// Voice channel the user sits in, if any.
    #[serde(default)]
    pub voice_channel_id: Option<ChannelId>,
    /// Whether the account is a bot.
    #[serde(default)]
    pub bot: bool,
}

impl Member {
    /// Build a human member, optionally connected to a voice channel.
    pub fn new(id: impl Into<UserId>, voice_channel_id: Option<ChannelId>) -> Self {
        Self {
            id: id.into(),
            voice_channel_id,
            bot: false,
        }
    }
}
