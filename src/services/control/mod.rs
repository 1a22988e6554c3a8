//! Conversation engine of one group: routes user input through per-user
//! request states and arbitrates the shared selector between users.

mod commands;
mod flows;
mod player_reactions;
#[cfg(test)]
mod tests;

use std::{sync::Arc, time::Duration};

use tokio::time::Instant;
use tracing::{debug, warn};

pub use self::commands::Command;
use crate::{
    config::AppConfig,
    error::ServiceError,
    services::playlist_service::{PlaylistService, StoreResponse},
    state::{
        ids::{ChannelId, SurfaceId, UserId},
        notifier::Notifier,
        player::{NOTHING_PLAYING, Player},
        requests::{
            ChatMessage, Claim, Flow, RequestState, RequestTable, SelectionWindow, UserInput,
        },
        selector::Selector,
        track::Track,
    },
    transport::{TrackSource, UiTransport, VoiceTransport},
};

/// Shown when a storage error interrupts a flow.
const STORAGE_UNAVAILABLE: &str = "Playlist storage is unavailable right now.";

/// External collaborators a group's engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Chat-side rendering.
    pub ui: Arc<dyn UiTransport>,
    /// Voice connection.
    pub voice: Arc<dyn VoiceTransport>,
    /// Track resolver.
    pub tracks: Arc<dyn TrackSource>,
    /// Playlist persistence.
    pub playlists: PlaylistService,
}

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSettings {
    /// How long a selection owner keeps the selector to themselves.
    pub selection_wait_time: Duration,
    /// Selector body while no selection is open.
    pub selection_placeholder: String,
}

impl ControlSettings {
    /// Settings taken from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            selection_wait_time: config.selection_wait_time(),
            selection_placeholder: config.selection_placeholder().to_string(),
        }
    }
}

/// The arbitration engine of one group.
pub struct Control {
    text_channel: ChannelId,
    ui: Arc<dyn UiTransport>,
    tracks: Arc<dyn TrackSource>,
    playlists: PlaylistService,
    notifier: Notifier,
    command_menu: Selector,
    selector: Selector,
    player: Player,
    requests: RequestTable,
    window: SelectionWindow,
    searched_tracks: Vec<Track>,
    initialized: bool,
}

impl Control {
    /// Build an engine bound to a group's text channel. Nothing is rendered
    /// until [`Control::setup`].
    pub fn new(
        text_channel: ChannelId,
        collaborators: Collaborators,
        settings: ControlSettings,
        notifier: Notifier,
    ) -> Self {
        let Collaborators {
            ui,
            voice,
            tracks,
            playlists,
        } = collaborators;
        Self {
            text_channel,
            command_menu: Selector::fixed(ui.clone(), Command::menu()),
            selector: Selector::open(ui.clone(), settings.selection_placeholder),
            player: Player::new(ui.clone(), voice),
            ui,
            tracks,
            playlists,
            notifier,
            requests: RequestTable::default(),
            window: SelectionWindow::new(settings.selection_wait_time),
            searched_tracks: Vec::new(),
            initialized: false,
        }
    }

    /// Render the command menu, the selector and the player.
    pub async fn setup(&mut self) {
        if let Err(err) = self.command_menu.render("").await {
            warn!(error = %err, "failed to render command menu");
        }
        if let Err(err) = self.selector.render("").await {
            warn!(error = %err, "failed to render selector");
        }
        self.player.render(NOTHING_PLAYING).await;
        self.initialized = true;
    }

    /// Whether a surface was rendered by this engine.
    pub fn owns_surface(&self, surface: SurfaceId) -> bool {
        self.command_menu.belongs_to(surface)
            || self.selector.belongs_to(surface)
            || self.player.belongs_to(surface)
    }

    /// Route one input through the author's request state.
    pub async fn process_input(&mut self, input: UserInput) {
        if !self.initialized {
            if let UserInput::Message(message) = &input {
                self.discard_message(message).await;
            }
            return;
        }

        match &input {
            UserInput::Message(message) if message.channel_id != self.text_channel => return,
            UserInput::Reaction {
                surface,
                emoji,
                user,
            } if self.player.belongs_to(*surface) => {
                self.player_reaction(emoji, user).await;
                return;
            }
            _ => {}
        }

        let author = input.author().id;
        let mut state = self.requests.state_of(author);
        // Root never re-dispatches, so this runs at most twice.
        loop {
            debug!(user_id = %author, ?state, "dispatching input");
            let flow = match state {
                RequestState::Root => self.root(&input).await,
                RequestState::AwaitingSearchQuery => self.search_query(&input).await,
                RequestState::AwaitingSongSelection => self.song_selection(&input).await,
                RequestState::AwaitingPlaylistSelectionForPlay => {
                    self.play_playlist_selection(&input).await
                }
                RequestState::AwaitingPlaylistNameForCreate => {
                    self.create_playlist_name(&input).await
                }
                RequestState::AwaitingPlaylistSelectionForDelete => {
                    self.delete_playlist_selection(&input).await
                }
                RequestState::AwaitingPlaylistSelectionForRename => {
                    self.rename_playlist_selection(&input).await
                }
                RequestState::AwaitingNewNameForRename => self.rename_playlist_name(&input).await,
                RequestState::AwaitingPlaylistSelectionForAddSong => {
                    self.add_song_selection(&input).await
                }
                RequestState::AwaitingPlaylistSelectionForRemoveSong => {
                    self.remove_song_selection(&input).await
                }
            };
            match flow {
                Flow::Done => break,
                Flow::Redispatch(next) => {
                    self.requests.set_state(author, next);
                    state = next;
                }
            }
        }
        self.requests.prune(author);
    }

    /// The voice side finished the current track.
    pub async fn song_ended(&mut self) {
        self.player.on_track_ended().await;
    }

    /// Show a notice to everyone in the channel.
    pub async fn send_notification(&mut self, text: &str) {
        self.notifier.send(text).await;
    }

    /// Remove the visible notice.
    pub async fn clear_notification(&mut self) {
        self.notifier.clear().await;
    }

    /// Claim the selector for `author` and show `options` under `header`.
    ///
    /// Returns `false` when another user's window is still open; the caller
    /// must route the author back to the menu.
    async fn request_selection(
        &mut self,
        author: UserId,
        options: Vec<String>,
        header: &str,
    ) -> bool {
        match self.window.claim(author, Instant::now()) {
            Claim::Rejected => {
                debug!(user_id = %author, owner = ?self.window.owner(), "selector busy");
                return false;
            }
            Claim::Granted => debug!(user_id = %author, "selector claimed"),
            Claim::Held => {}
        }
        self.selector.set_options(options);
        if let Err(err) = self.selector.render(header).await {
            warn!(error = %err, "failed to render selector");
        }
        true
    }

    /// Empty the selector, show the placeholder and free the window.
    async fn reset_selection(&mut self) {
        self.selector.set_options(Vec::new());
        if let Err(err) = self.selector.render("").await {
            warn!(error = %err, "failed to reset selector");
        }
        self.window.release();
        self.searched_tracks.clear();
    }

    async fn notify(&mut self, text: &str) {
        self.notifier.send(text).await;
    }

    async fn report(&mut self, author: UserId, response: Result<StoreResponse, ServiceError>) {
        match response {
            Ok(response) => self.notify(&response.message).await,
            Err(err) => self.report_storage_failure(author, &err).await,
        }
    }

    async fn report_storage_failure(&mut self, author: UserId, err: &ServiceError) {
        warn!(user_id = %author, error = %err, "playlist operation failed");
        self.notify(&format!("{} {STORAGE_UNAVAILABLE}", author.mention()))
            .await;
    }

    async fn discard_message(&self, message: &ChatMessage) {
        if let Err(err) = self.ui.delete_message(message.id).await {
            warn!(error = %err, message_id = %message.id, "failed to delete message");
        }
    }
}
