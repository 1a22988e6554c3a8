use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::ids::UserId;

/// Named, per-user list of track identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistEntity {
    /// Stable identifier for the playlist.
    pub id: Uuid,
    /// Owner of the playlist.
    pub author_id: UserId,
    /// Name, unique per author.
    pub name: String,
    /// Content identifiers in insertion order, without duplicates.
    pub songs: Vec<String>,
    /// Creation time.
    pub created_at: SystemTime,
    /// Last time the playlist was modified.
    pub updated_at: SystemTime,
}

impl PlaylistEntity {
    /// A new empty playlist.
    pub fn new(author_id: UserId, name: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            name: name.into(),
            songs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
