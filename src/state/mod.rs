pub mod ids;
pub mod notifier;
pub mod player;
pub mod queue;
pub mod requests;
pub mod selector;
pub mod track;

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    dao::playlist_store::StoreSlot,
    services::{
        control::{Collaborators, ControlSettings},
        music_server::{MusicServer, SessionEvent, SessionHandle},
        playlist_service::{PlaylistLimits, PlaylistService},
    },
    state::ids::{ChannelId, GroupId},
    transport::{TrackSource, gateway::{GatewayLink, GatewayTransport}},
};

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the playlist store slot, the
/// bridge link and the registry of running group sessions.
pub struct AppState {
    config: Arc<AppConfig>,
    store: Arc<StoreSlot>,
    gateway: Arc<GatewayLink>,
    tracks: Arc<dyn TrackSource>,
    sessions: DashMap<GroupId, SessionHandle>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a playlist store is installed.
    pub fn new(config: AppConfig, tracks: Arc<dyn TrackSource>) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            store: Arc::new(StoreSlot::new()),
            gateway: Arc::new(GatewayLink::default()),
            tracks,
            sessions: DashMap::new(),
        })
    }

    /// Application configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Slot holding the active playlist store.
    pub fn store(&self) -> &Arc<StoreSlot> {
        &self.store
    }

    /// Link to the connected bridge.
    pub fn gateway(&self) -> &Arc<GatewayLink> {
        &self.gateway
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    /// Playlist operations bound to the shared store slot.
    pub fn playlist_service(&self) -> PlaylistService {
        PlaylistService::new(
            self.store.clone(),
            PlaylistLimits {
                max_playlists: self.config.max_playlists(),
                max_name_len: self.config.max_playlist_name_len(),
            },
        )
    }

    /// Start the session of a group unless one already runs on that channel.
    ///
    /// Returns whether a new session was started.
    pub fn ensure_session(&self, group_id: GroupId, channel_id: ChannelId) -> bool {
        if let Some(existing) = self.sessions.get(&group_id) {
            if existing.channel_id() == channel_id && !existing.is_closed() {
                return false;
            }
        }

        let transport = Arc::new(GatewayTransport::new(
            self.gateway.clone(),
            group_id,
            channel_id,
        ));
        let collaborators = Collaborators {
            ui: transport.clone(),
            voice: transport,
            tracks: self.tracks.clone(),
            playlists: self.playlist_service(),
        };
        let settings = ControlSettings::from_config(&self.config);
        let handle = MusicServer::new(group_id, channel_id, collaborators, settings).spawn();
        self.sessions.insert(group_id, handle);
        info!(%group_id, %channel_id, "session started");
        true
    }

    /// Queue an event for a group's session; `false` when none runs.
    pub fn route_to_session(&self, group_id: GroupId, event: SessionEvent) -> bool {
        let Some(handle) = self.sessions.get(&group_id).map(|entry| entry.clone()) else {
            return false;
        };
        if handle.send(event) {
            return true;
        }
        warn!(%group_id, "session task is gone; dropping it");
        self.sessions.remove(&group_id);
        false
    }

    /// Stop every session; their surfaces died with the bridge that rendered them.
    pub fn close_sessions(&self) {
        let count = self.sessions.len();
        self.sessions.clear();
        if count > 0 {
            info!(count, "sessions closed");
        }
    }

    /// Number of running sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
