use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::{dao::models::PlaylistEntity, state::ids::UserId};

/// Stored shape of a playlist. Identifiers are kept as strings so filters
/// match regardless of the driver's binary subtype handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlaylistDocument {
    #[serde(rename = "_id")]
    id: String,
    author_id: String,
    name: String,
    #[serde(default)]
    songs: Vec<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<PlaylistEntity> for MongoPlaylistDocument {
    fn from(value: PlaylistEntity) -> Self {
        Self {
            id: value.id.to_string(),
            author_id: value.author_id.to_string(),
            name: value.name,
            songs: value.songs,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoPlaylistDocument> for PlaylistEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlaylistDocument) -> Result<Self, Self::Error> {
        let malformed = |reason: String| MongoDaoError::MalformedDocument {
            id: value.id.clone(),
            reason,
        };
        let id = Uuid::parse_str(&value.id).map_err(|err| malformed(err.to_string()))?;
        let author_id = value
            .author_id
            .parse::<u64>()
            .map(UserId)
            .map_err(|err| malformed(err.to_string()))?;

        Ok(Self {
            id,
            author_id,
            name: value.name,
            songs: value.songs,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! { "_id": id.to_string() }
}

pub fn author_filter(author_id: UserId, name: Option<&str>) -> Document {
    let mut filter = doc! { "author_id": author_id.to_string() };
    if let Some(name) = name {
        filter.insert("name", name);
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_convert_back_to_entities() {
        let mut playlist = PlaylistEntity::new(UserId(81234567890123456), "Road Trip");
        playlist.songs = vec!["abc".into(), "def".into()];
        let document = MongoPlaylistDocument::from(playlist.clone());
        assert_eq!(document.author_id, "81234567890123456");

        let back = PlaylistEntity::try_from(document).unwrap();
        assert_eq!(back.id, playlist.id);
        assert_eq!(back.author_id, playlist.author_id);
        assert_eq!(back.songs, playlist.songs);
    }

    #[test]
    fn malformed_ids_are_reported() {
        let mut document = MongoPlaylistDocument::from(PlaylistEntity::new(UserId(1), "A"));
        document.id = "not-a-uuid".into();
        assert!(matches!(
            PlaylistEntity::try_from(document),
            Err(MongoDaoError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn author_filter_optionally_pins_the_name() {
        assert_eq!(author_filter(UserId(5), None), doc! { "author_id": "5" });
        assert_eq!(
            author_filter(UserId(5), Some("Mix")),
            doc! { "author_id": "5", "name": "Mix" }
        );
    }
}
