//! Now-playing surface and transport control of one group.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    state::{
        ids::{ChannelId, Member, SurfaceId},
        queue::Queue,
        track::Track,
    },
    transport::{UiTransport, VoiceTransport},
};

/// Shown on the player surface when the queue ran dry.
pub const NOTHING_PLAYING: &str = "Nothing playing.";
/// Shown on the player surface after an explicit stop.
pub const NOT_PLAYING_ANYTHING: &str = "Not playing anything.";

/// Reactions attached to the player surface, in display order.
pub const PLAYER_REACTIONS: [&str; 12] = [
    "⏮", "⏸", "▶", "⏭", "⏹", "🔄", "🔀", "❌", "💿", "ℹ️", "🇭", "🇶",
];

/// What a reaction on the player surface asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// Replay the previous track.
    Previous,
    /// Pause playback.
    Pause,
    /// Resume playback.
    Resume,
    /// Skip to the next track.
    Skip,
    /// Stop, clear the queue and leave voice.
    Stop,
    /// Replay the current track from the start.
    Restart,
    /// Shuffle the queued tracks.
    Shuffle,
    /// Remove the current track from one of the user's playlists.
    RemoveFromPlaylist,
    /// Add the current track to one of the user's playlists.
    AddToPlaylist,
    /// Describe the current track.
    Info,
    /// List recently played tracks.
    History,
    /// List upcoming tracks.
    Queue,
}

impl PlayerAction {
    /// Map a reaction emoji to its action.
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        let action = match emoji {
            "⏮" => Self::Previous,
            "⏸" => Self::Pause,
            "▶" => Self::Resume,
            "⏭" => Self::Skip,
            "⏹" => Self::Stop,
            "🔄" => Self::Restart,
            "🔀" => Self::Shuffle,
            "❌" => Self::RemoveFromPlaylist,
            "💿" => Self::AddToPlaylist,
            "ℹ️" => Self::Info,
            "🇭" => Self::History,
            "🇶" => Self::Queue,
            _ => return None,
        };
        Some(action)
    }

    /// Whether the acting user must share the player's voice channel.
    pub fn controls_transport(&self) -> bool {
        matches!(
            self,
            Self::Previous
                | Self::Pause
                | Self::Resume
                | Self::Skip
                | Self::Stop
                | Self::Restart
        )
    }
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Nothing handed to the voice transport.
    Idle,
    /// A track was handed over and has not ended yet.
    Playing,
}

/// Owns the queue, the voice binding and the now-playing surface.
///
/// Skip, restart and previous only move the cursor and stop the transport; the
/// bridge's track-ended event is what advances playback.
pub struct Player {
    ui: Arc<dyn UiTransport>,
    voice: Arc<dyn VoiceTransport>,
    surface: Option<SurfaceId>,
    queue: Queue,
    status: PlayerStatus,
    voice_channel: Option<ChannelId>,
}

impl Player {
    /// Create an idle player; nothing is rendered until [`Player::render`].
    pub fn new(ui: Arc<dyn UiTransport>, voice: Arc<dyn VoiceTransport>) -> Self {
        Self {
            ui,
            voice,
            surface: None,
            queue: Queue::new(),
            status: PlayerStatus::Idle,
            voice_channel: None,
        }
    }

    /// Show `text` on the player surface, creating it on first use.
    pub async fn render(&mut self, text: &str) {
        let result = match self.surface {
            Some(surface) => self.ui.edit_surface(surface, text.to_string()).await,
            None => {
                let reactions = PLAYER_REACTIONS.iter().map(|r| r.to_string()).collect();
                self.ui
                    .send_surface(text.to_string(), reactions)
                    .await
                    .map(|surface| self.surface = Some(surface))
            }
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to render player");
        }
    }

    /// Whether the given surface is the player's.
    pub fn belongs_to(&self, surface: SurfaceId) -> bool {
        self.surface == Some(surface)
    }

    /// Queue a track on behalf of `member`, starting playback when idle.
    ///
    /// Returns `false` when the member is not in a voice channel.
    pub async fn enqueue(&mut self, track: Track, member: &Member) -> bool {
        if !self.join_voice_channel(member).await {
            return false;
        }
        debug!(title = %track.title, "track queued");
        self.queue.append(Some(track));
        if self.status == PlayerStatus::Idle {
            self.play_next().await;
        }
        true
    }

    async fn join_voice_channel(&mut self, member: &Member) -> bool {
        let Some(channel) = member.voice_channel_id else {
            return false;
        };
        if self.voice_channel == Some(channel) {
            return true;
        }
        if let Err(err) = self.voice.connect(channel).await {
            warn!(error = %err, %channel, "failed to join voice channel");
            return false;
        }
        info!(%channel, "joined voice channel");
        self.voice_channel = Some(channel);
        true
    }

    async fn play_next(&mut self) -> bool {
        let Some(track) = self.queue.advance().cloned() else {
            self.status = PlayerStatus::Idle;
            self.render(NOTHING_PLAYING).await;
            return false;
        };
        self.render(&track.now_playing_text()).await;
        match self.voice.play(track).await {
            Ok(()) => {
                self.status = PlayerStatus::Playing;
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to start track");
                self.status = PlayerStatus::Idle;
                false
            }
        }
    }

    /// React to the current track finishing.
    ///
    /// Returns whether another track started.
    pub async fn on_track_ended(&mut self) -> bool {
        self.status = PlayerStatus::Idle;
        if !self.queue.has_queued() {
            self.render(NOTHING_PLAYING).await;
            return false;
        }
        self.play_next().await
    }

    /// Pause the transport.
    pub async fn pause(&mut self) {
        if let Err(err) = self.voice.pause().await {
            warn!(error = %err, "failed to pause");
        }
    }

    /// Resume the transport.
    pub async fn resume(&mut self) {
        if let Err(err) = self.voice.resume().await {
            warn!(error = %err, "failed to resume");
        }
    }

    /// Skip to the next track.
    pub async fn skip(&mut self) {
        if self.status == PlayerStatus::Playing {
            self.stop_transport().await;
        }
    }

    /// Replay the current track.
    pub async fn restart(&mut self) {
        if self.status == PlayerStatus::Playing {
            self.queue.jump(-1);
            self.stop_transport().await;
        }
    }

    /// Replay the previous track. Without history this is a no-op.
    pub async fn previous(&mut self) {
        if self.status == PlayerStatus::Playing && !self.queue.history_tracks().is_empty() {
            self.queue.jump(-2);
            self.stop_transport().await;
        }
    }

    /// Clear the queue, stop playback and leave the voice channel.
    pub async fn stop(&mut self) {
        self.queue.reset();
        if self.voice_channel.take().is_some() {
            self.stop_transport().await;
            if let Err(err) = self.voice.disconnect().await {
                warn!(error = %err, "failed to leave voice channel");
            }
        }
        self.status = PlayerStatus::Idle;
        self.render(NOT_PLAYING_ANYTHING).await;
    }

    /// Shuffle the queued tracks.
    pub fn shuffle(&mut self) {
        self.queue.shuffle();
    }

    async fn stop_transport(&mut self) {
        if let Err(err) = self.voice.stop().await {
            warn!(error = %err, "failed to stop track");
        }
    }

    /// Track under the cursor.
    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current_track()
    }

    /// Already played tracks, oldest first.
    pub fn history_tracks(&self) -> &[Track] {
        self.queue.history_tracks()
    }

    /// Upcoming tracks.
    pub fn queued_tracks(&self) -> &[Track] {
        self.queue.queued_tracks()
    }

    /// Voice channel the player is bound to.
    pub fn voice_channel(&self) -> Option<ChannelId> {
        self.voice_channel
    }

    /// Current playback status.
    pub fn status(&self) -> PlayerStatus {
        self.status
    }
}
