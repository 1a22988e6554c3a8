use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::LavalinkConfig,
    state::track::Track,
    transport::{TrackSource, TrackSourceError},
};

const LOAD_TRACKS_PATH: &str = "/v4/loadtracks";
const SEARCH_PREFIX: &str = "ytsearch:";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Track resolver backed by a Lavalink node's REST API.
#[derive(Clone)]
pub struct LavalinkClient {
    client: Client,
    base_url: Arc<str>,
    password: Arc<str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadResponse {
    load_type: LoadType,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum LoadType {
    Track,
    Search,
    Playlist,
    Empty,
    Error,
}

#[derive(Debug, Deserialize)]
struct NodeTrack {
    encoded: String,
    info: NodeTrackInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeTrackInfo {
    identifier: String,
    author: String,
    length: u64,
    title: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    artwork_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodePlaylist {
    tracks: Vec<NodeTrack>,
}

#[derive(Debug, Deserialize)]
struct NodeException {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cause: Option<String>,
}

impl From<NodeTrack> for Track {
    fn from(track: NodeTrack) -> Self {
        Track {
            encoded: track.encoded,
            identifier: track.info.identifier,
            title: track.info.title,
            author: track.info.author,
            length_ms: track.info.length,
            uri: track.info.uri,
            artwork_url: track.info.artwork_url,
        }
    }
}

impl LavalinkClient {
    /// Build a client for the configured node.
    pub fn new(config: &LavalinkConfig) -> Result<Self, TrackSourceError> {
        let client = Client::builder()
            .build()
            .map_err(|source| TrackSourceError::ClientBuilder { source })?;
        Ok(Self {
            client,
            base_url: config.base_url().into(),
            password: config.password.as_str().into(),
        })
    }

    async fn load_tracks(&self, identifier: &str) -> Result<Vec<Track>, TrackSourceError> {
        let url = format!("{}{LOAD_TRACKS_PATH}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.password.as_ref())
            .query(&[("identifier", identifier)])
            .send()
            .await
            .map_err(|source| TrackSourceError::RequestSend {
                path: LOAD_TRACKS_PATH.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackSourceError::RequestStatus {
                path: LOAD_TRACKS_PATH.to_string(),
                status,
            });
        }

        let body: LoadResponse =
            response
                .json()
                .await
                .map_err(|source| TrackSourceError::DecodeResponse {
                    path: LOAD_TRACKS_PATH.to_string(),
                    source,
                })?;
        debug!(identifier, load_type = ?body.load_type, "tracks loaded");
        parse_load_response(identifier, body)
    }
}

fn parse_load_response(
    identifier: &str,
    body: LoadResponse,
) -> Result<Vec<Track>, TrackSourceError> {
    let decode = |source| TrackSourceError::DeserializeValue {
        identifier: identifier.to_string(),
        source,
    };
    match body.load_type {
        LoadType::Track => {
            let track: NodeTrack = serde_json::from_value(body.data).map_err(decode)?;
            Ok(vec![track.into()])
        }
        LoadType::Search => {
            let tracks: Vec<NodeTrack> = serde_json::from_value(body.data).map_err(decode)?;
            Ok(tracks.into_iter().map(Track::from).collect())
        }
        LoadType::Playlist => {
            let playlist: NodePlaylist = serde_json::from_value(body.data).map_err(decode)?;
            Ok(playlist.tracks.into_iter().map(Track::from).collect())
        }
        LoadType::Empty => Ok(Vec::new()),
        LoadType::Error => {
            let exception: NodeException = serde_json::from_value(body.data).map_err(decode)?;
            Err(TrackSourceError::LoadFailed {
                identifier: identifier.to_string(),
                message: exception
                    .message
                    .or(exception.cause)
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }
}

/// Plain text becomes a YouTube search; links are loaded as-is.
fn search_identifier(query: &str) -> String {
    let query = query.trim();
    if query.starts_with("http://") || query.starts_with("https://") {
        query.to_string()
    } else {
        format!("{SEARCH_PREFIX}{query}")
    }
}

impl TrackSource for LavalinkClient {
    fn search(&self, query: String) -> BoxFuture<'static, Result<Vec<Track>, TrackSourceError>> {
        let client = self.clone();
        Box::pin(async move { client.load_tracks(&search_identifier(&query)).await })
    }

    fn resolve_by_id(
        &self,
        content_id: String,
    ) -> BoxFuture<'static, Result<Option<Track>, TrackSourceError>> {
        let client = self.clone();
        Box::pin(async move {
            let tracks = client.load_tracks(&format!("{WATCH_URL}{content_id}")).await?;
            Ok(tracks.into_iter().next())
        })
    }
}
