//! State handlers of the per-user conversations.

use tracing::{debug, info, warn};

use super::{Command, Control};
use crate::state::{
    ids::{Member, UserId},
    player::NOT_PLAYING_ANYTHING,
    requests::{Flow, RequestState, UserInput},
    selector::SelectionOutcome,
    track::Track,
};

/// Result of the common prologue of selector-driven states.
enum Selection {
    /// The owner picked an option.
    Chosen { index: usize, user: Member },
    /// The input was consumed by the prologue.
    Handled(Flow),
}

/// Result of the common prologue of message-driven states.
enum Reply {
    /// The author sent the expected text.
    Text { content: String, author: Member },
    /// A reaction aborted the flow.
    Aborted,
}

impl Control {
    /// Command selection.
    pub(super) async fn root(&mut self, input: &UserInput) -> Flow {
        let (surface, emoji, user) = match input {
            UserInput::Message(message) => {
                self.discard_message(message).await;
                return Flow::Done;
            }
            UserInput::Reaction {
                surface,
                emoji,
                user,
            } => (*surface, emoji.as_str(), user),
        };
        if !self.command_menu.belongs_to(surface) {
            return Flow::Done;
        }
        let SelectionOutcome::Selected(index) = self.command_menu.resolve(emoji).await else {
            return Flow::Done;
        };
        let Some(command) = Command::from_index(index) else {
            return Flow::Done;
        };
        info!(user_id = %user.id, ?command, "command selected");

        let author = user.id;
        match command {
            Command::Search => {
                if !self.request_selection(author, Vec::new(), "").await {
                    return Flow::Done;
                }
                self.requests
                    .set_state(author, RequestState::AwaitingSearchQuery);
                self.notify(&format!(
                    "{} What song do you want to search for?",
                    author.mention()
                ))
                .await;
            }
            Command::PlayPlaylist => {
                self.offer_playlists(
                    author,
                    "play",
                    RequestState::AwaitingPlaylistSelectionForPlay,
                    String::new(),
                )
                .await;
            }
            Command::CreatePlaylist => {
                self.requests
                    .set_state(author, RequestState::AwaitingPlaylistNameForCreate);
                self.notify(&format!(
                    "{} What is the name of the playlist?",
                    author.mention()
                ))
                .await;
            }
            Command::DeletePlaylist => {
                self.offer_playlists(
                    author,
                    "delete",
                    RequestState::AwaitingPlaylistSelectionForDelete,
                    String::new(),
                )
                .await;
            }
            Command::RenamePlaylist => {
                self.offer_playlists(
                    author,
                    "rename",
                    RequestState::AwaitingPlaylistSelectionForRename,
                    String::new(),
                )
                .await;
            }
            Command::AddSongToPlaylist => self.offer_current_track(author, true).await,
            Command::RemoveSongFromPlaylist => self.offer_current_track(author, false).await,
            Command::ShowQueue => self.show_queue(author).await,
            Command::ShowHistory => self.show_history(author).await,
        }
        Flow::Done
    }

    /// Open a playlist selection for the current track, adding it when `add`
    /// is set and removing it otherwise.
    pub(super) async fn offer_current_track(&mut self, author: UserId, add: bool) {
        let Some(content_id) = self.player.current_track().map(Track::content_id) else {
            self.notify(&format!("{} {NOT_PLAYING_ANYTHING}", author.mention()))
                .await;
            return;
        };
        let (purpose, next) = if add {
            ("add song to", RequestState::AwaitingPlaylistSelectionForAddSong)
        } else {
            (
                "delete song from",
                RequestState::AwaitingPlaylistSelectionForRemoveSong,
            )
        };
        self.offer_playlists(author, purpose, next, content_id)
            .await;
    }

    /// List the author's playlists on the selector and move them to `next`.
    async fn offer_playlists(
        &mut self,
        author: UserId,
        purpose: &str,
        next: RequestState,
        value: String,
    ) {
        let playlists = match self.playlists.list_playlists(author, None).await {
            Ok(playlists) => playlists,
            Err(err) => {
                self.report_storage_failure(author, &err).await;
                return;
            }
        };
        if playlists.is_empty() {
            self.notify(&format!("{} You have no playlists.", author.mention()))
                .await;
            return;
        }
        let names = playlists.into_iter().map(|playlist| playlist.name).collect();
        let header = format!("{} Select **Playlist** to {purpose}:", author.mention());
        if !self.request_selection(author, names, &header).await {
            return;
        }
        self.requests.open(author, next, value);
    }

    /// Prologue shared by every state waiting on the selector.
    ///
    /// `state` is restored when the owner only turned a page.
    async fn resolve_selection(&mut self, input: &UserInput, state: RequestState) -> Selection {
        let (surface, emoji, user) = match input {
            UserInput::Message(message) => {
                self.discard_message(message).await;
                return Selection::Handled(Flow::Done);
            }
            UserInput::Reaction {
                surface,
                emoji,
                user,
            } => (*surface, emoji.as_str(), user),
        };

        if self.command_menu.belongs_to(surface) {
            if self.window.is_owner(user.id) {
                self.reset_selection().await;
            }
            return Selection::Handled(Flow::Redispatch(RequestState::Root));
        }

        self.requests.set_state(user.id, RequestState::Root);
        if !self.window.is_owner(user.id) {
            debug!(user_id = %user.id, ?state, "stale selection from a non-owner");
            return Selection::Handled(Flow::Done);
        }
        if !self.selector.belongs_to(surface) {
            self.reset_selection().await;
            return Selection::Handled(Flow::Done);
        }

        match self.selector.resolve(emoji).await {
            SelectionOutcome::Paged => {
                self.requests.set_state(user.id, state);
                Selection::Handled(Flow::Done)
            }
            SelectionOutcome::Invalid => {
                self.reset_selection().await;
                self.notify(&format!("{} Invalid selection.", user.id.mention()))
                    .await;
                Selection::Handled(Flow::Done)
            }
            SelectionOutcome::Selected(index) => Selection::Chosen {
                index,
                user: user.clone(),
            },
        }
    }

    /// Prologue shared by every state waiting on a chat message.
    async fn await_reply(&mut self, input: &UserInput) -> Reply {
        match input {
            UserInput::Reaction { user, .. } => {
                self.requests.set_state(user.id, RequestState::Root);
                if self.window.is_owner(user.id) {
                    self.reset_selection().await;
                }
                Reply::Aborted
            }
            UserInput::Message(message) => {
                self.discard_message(message).await;
                Reply::Text {
                    content: message.content.clone(),
                    author: message.author.clone(),
                }
            }
        }
    }

    fn chosen_option(&self, index: usize) -> String {
        self.selector.option(index).unwrap_or_default().to_string()
    }

    fn request_value(&self, author: UserId) -> String {
        self.requests
            .get(author)
            .map(|request| request.value.clone())
            .unwrap_or_default()
    }

    pub(super) async fn create_playlist_name(&mut self, input: &UserInput) -> Flow {
        let Reply::Text { content, author } = self.await_reply(input).await else {
            return Flow::Done;
        };
        let response = self.playlists.create_playlist(&content, author.id).await;
        self.requests.remove(author.id);
        self.report(author.id, response).await;
        Flow::Done
    }

    pub(super) async fn delete_playlist_selection(&mut self, input: &UserInput) -> Flow {
        let state = RequestState::AwaitingPlaylistSelectionForDelete;
        let (index, user) = match self.resolve_selection(input, state).await {
            Selection::Chosen { index, user } => (index, user),
            Selection::Handled(flow) => return flow,
        };
        let name = self.chosen_option(index);
        let response = self.playlists.delete_playlist(&name, user.id).await;
        self.report(user.id, response).await;
        self.requests.remove(user.id);
        self.reset_selection().await;
        Flow::Done
    }

    pub(super) async fn rename_playlist_selection(&mut self, input: &UserInput) -> Flow {
        let state = RequestState::AwaitingPlaylistSelectionForRename;
        let (index, user) = match self.resolve_selection(input, state).await {
            Selection::Chosen { index, user } => (index, user),
            Selection::Handled(flow) => return flow,
        };
        let name = self.chosen_option(index);
        self.notify(&format!(
            "{} What should **{name}** be renamed to?",
            user.id.mention()
        ))
        .await;
        self.requests
            .open(user.id, RequestState::AwaitingNewNameForRename, name);
        self.reset_selection().await;
        Flow::Done
    }

    pub(super) async fn rename_playlist_name(&mut self, input: &UserInput) -> Flow {
        let Reply::Text { content, author } = self.await_reply(input).await else {
            return Flow::Done;
        };
        let old_name = self.request_value(author.id);
        let response = self
            .playlists
            .rename_playlist(author.id, &old_name, &content)
            .await;
        self.requests.remove(author.id);
        self.report(author.id, response).await;
        Flow::Done
    }

    pub(super) async fn add_song_selection(&mut self, input: &UserInput) -> Flow {
        let state = RequestState::AwaitingPlaylistSelectionForAddSong;
        let (index, user) = match self.resolve_selection(input, state).await {
            Selection::Chosen { index, user } => (index, user),
            Selection::Handled(flow) => return flow,
        };
        let playlist = self.chosen_option(index);
        let content_id = self.request_value(user.id);
        let response = self
            .playlists
            .add_song(user.id, &playlist, &content_id)
            .await;
        self.report(user.id, response).await;
        self.requests.remove(user.id);
        self.reset_selection().await;
        Flow::Done
    }

    pub(super) async fn remove_song_selection(&mut self, input: &UserInput) -> Flow {
        let state = RequestState::AwaitingPlaylistSelectionForRemoveSong;
        let (index, user) = match self.resolve_selection(input, state).await {
            Selection::Chosen { index, user } => (index, user),
            Selection::Handled(flow) => return flow,
        };
        let playlist = self.chosen_option(index);
        let content_id = self.request_value(user.id);
        let response = self
            .playlists
            .remove_song(user.id, &playlist, &content_id)
            .await;
        self.report(user.id, response).await;
        self.requests.remove(user.id);
        self.reset_selection().await;
        Flow::Done
    }

    pub(super) async fn play_playlist_selection(&mut self, input: &UserInput) -> Flow {
        let state = RequestState::AwaitingPlaylistSelectionForPlay;
        let (index, user) = match self.resolve_selection(input, state).await {
            Selection::Chosen { index, user } => (index, user),
            Selection::Handled(flow) => return flow,
        };
        let playlist = self.chosen_option(index);
        self.requests.remove(user.id);

        match self.playlists.list_songs(user.id, &playlist).await {
            Ok(content_ids) => self.queue_playlist(&user, &playlist, content_ids).await,
            Err(err) => self.report_storage_failure(user.id, &err).await,
        }
        self.reset_selection().await;
        Flow::Done
    }

    async fn queue_playlist(&mut self, user: &Member, playlist: &str, content_ids: Vec<String>) {
        let mention = user.id.mention();
        let mut tracks = Vec::with_capacity(content_ids.len());
        for content_id in content_ids {
            match self.tracks.resolve_by_id(content_id.clone()).await {
                Ok(Some(track)) => tracks.push(track),
                Ok(None) => {
                    self.notify(&format!("{mention} Song video is unavailable: {content_id}"))
                        .await;
                }
                Err(err) => {
                    warn!(error = %err, %content_id, "failed to resolve playlist song");
                    self.notify(&format!("{mention} Song video is unavailable: {content_id}"))
                        .await;
                }
            }
        }

        let mut queued = 0;
        for track in tracks {
            if !self.player.enqueue(track, user).await {
                self.notify(&format!("{mention} Join a voice channel.")).await;
                return;
            }
            queued += 1;
        }
        if queued > 0 {
            info!(user_id = %user.id, %playlist, queued, "playlist queued");
            self.notify(&format!(
                "{mention} Queued {queued} songs from **{playlist}**."
            ))
            .await;
        }
    }

    pub(super) async fn search_query(&mut self, input: &UserInput) -> Flow {
        let Reply::Text { content, author } = self.await_reply(input).await else {
            return Flow::Done;
        };
        let mention = author.id.mention();
        self.requests.set_state(author.id, RequestState::Root);

        let tracks = match self.tracks.search(content.clone()).await {
            Ok(tracks) => tracks,
            Err(err) => {
                warn!(error = %err, query = %content, "track search failed");
                self.release_if_owner(author.id).await;
                self.notify(&format!("{mention} Search failed, try again later."))
                    .await;
                return Flow::Done;
            }
        };
        if tracks.is_empty() {
            self.release_if_owner(author.id).await;
            self.notify(&format!(
                "{mention} Did not find any songs that match your query."
            ))
            .await;
            return Flow::Done;
        }

        let titles = tracks.iter().map(|track| track.title.clone()).collect();
        let header = format!("{mention} Select **Song** to play:");
        if !self.request_selection(author.id, titles, &header).await {
            return Flow::Done;
        }
        self.searched_tracks = tracks;
        self.requests
            .set_state(author.id, RequestState::AwaitingSongSelection);
        Flow::Done
    }

    pub(super) async fn song_selection(&mut self, input: &UserInput) -> Flow {
        let state = RequestState::AwaitingSongSelection;
        let (index, user) = match self.resolve_selection(input, state).await {
            Selection::Chosen { index, user } => (index, user),
            Selection::Handled(flow) => return flow,
        };
        self.requests.remove(user.id);
        let mention = user.id.mention();

        match self.searched_tracks.get(index).cloned() {
            Some(track) => {
                if self.player.enqueue(track, &user).await {
                    self.notify(&format!("{mention} Added song to queue.")).await;
                } else {
                    self.notify(&format!("{mention} Join a voice channel.")).await;
                }
            }
            None => {
                self.notify(&format!("{mention} Invalid selection.")).await;
            }
        }
        self.reset_selection().await;
        Flow::Done
    }

    async fn release_if_owner(&mut self, author: UserId) {
        if self.window.is_owner(author) {
            self.reset_selection().await;
        }
    }
}
