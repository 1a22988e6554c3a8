use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Playable media reference resolved by the audio collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Track {
    /// Opaque handle the audio node needs to play the track.
    pub encoded: String,
    /// Source-specific identifier (e.g. the video id).
    pub identifier: String,
    /// Display title.
    pub title: String,
    /// Uploader / artist.
    pub author: String,
    /// Track length in milliseconds.
    pub length_ms: u64,
    /// Public URI of the track.
    pub uri: Option<String>,
    /// Thumbnail URL.
    pub artwork_url: Option<String>,
}

impl Track {
    /// Identifier used to store the track in playlists.
    ///
    /// Taken from the thumbnail path (`https://i.ytimg.com/vi/<id>/hq.jpg`),
    /// falling back to the source identifier when no thumbnail is known.
    pub fn content_id(&self) -> String {
        self.artwork_url
            .as_deref()
            .and_then(|url| url.rsplit('/').nth(1))
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| self.identifier.clone())
    }

    /// Track length.
    pub fn length(&self) -> Duration {
        Duration::from_millis(self.length_ms)
    }

    /// Text shown on the now-playing surface.
    pub fn now_playing_text(&self) -> String {
        self.uri.clone().unwrap_or_else(|| self.title.clone())
    }
}

/// Render a duration the way the now-playing info shows it (`H:MM:SS`).
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
pub(crate) fn sample_track(title: &str) -> Track {
    Track {
        encoded: format!("enc-{title}"),
        identifier: format!("id-{title}"),
        title: title.to_string(),
        author: "someone".into(),
        length_ms: 185_000,
        uri: Some(format!("https://www.youtube.com/watch?v=id-{title}")),
        artwork_url: Some(format!("https://i.ytimg.com/vi/vid-{title}/maxresdefault.jpg")),
    }
}
