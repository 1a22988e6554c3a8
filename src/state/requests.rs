//! Per-user conversation state and the shared selection ownership window.

use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;

use crate::state::ids::{ChannelId, Member, MessageId, SurfaceId, UserId};

/// Where a user's conversation with the bot currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Waiting for a command-menu choice.
    Root,
    /// Waiting for the search query message.
    AwaitingSearchQuery,
    /// Waiting for a song choice among search results.
    AwaitingSongSelection,
    /// Waiting for a playlist to enqueue.
    AwaitingPlaylistSelectionForPlay,
    /// Waiting for the name of a new playlist.
    AwaitingPlaylistNameForCreate,
    /// Waiting for a playlist to delete.
    AwaitingPlaylistSelectionForDelete,
    /// Waiting for a playlist to rename.
    AwaitingPlaylistSelectionForRename,
    /// Waiting for the new name of the chosen playlist.
    AwaitingNewNameForRename,
    /// Waiting for a playlist to add the current song to.
    AwaitingPlaylistSelectionForAddSong,
    /// Waiting for a playlist to remove the current song from.
    AwaitingPlaylistSelectionForRemoveSong,
}

/// One user's in-flight conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Who the conversation belongs to.
    pub author_id: UserId,
    /// Current state.
    pub state: RequestState,
    /// Payload carried between states (playlist name, track id).
    pub value: String,
}

impl Request {
    /// A fresh conversation at the command menu.
    pub fn new(author_id: UserId) -> Self {
        Self {
            author_id,
            state: RequestState::Root,
            value: String::new(),
        }
    }
}

/// Outcome of one state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The input was consumed.
    Done,
    /// Run the same input again against another state.
    Redispatch(RequestState),
}

/// Input delivered to the conversation engine.
#[derive(Debug, Clone)]
pub enum UserInput {
    /// A reaction on one of our surfaces.
    Reaction {
        /// Surface reacted on.
        surface: SurfaceId,
        /// Reaction emoji.
        emoji: String,
        /// Reacting user.
        user: Member,
    },
    /// A message in the dedicated text channel.
    Message(ChatMessage),
}

impl UserInput {
    /// The acting user.
    pub fn author(&self) -> &Member {
        match self {
            Self::Reaction { user, .. } => user,
            Self::Message(message) => &message.author,
        }
    }
}

/// A user-authored chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Message identity.
    pub id: MessageId,
    /// Channel it was posted in.
    pub channel_id: ChannelId,
    /// Raw text.
    pub content: String,
    /// Author.
    pub author: Member,
}

/// Conversations keyed by user, at most one per user.
#[derive(Debug, Default)]
pub struct RequestTable {
    requests: IndexMap<UserId, Request>,
}

impl RequestTable {
    /// State of a user's conversation; users without one are at the menu.
    pub fn state_of(&self, author: UserId) -> RequestState {
        self.requests
            .get(&author)
            .map_or(RequestState::Root, |request| request.state)
    }

    /// A user's conversation, if any.
    pub fn get(&self, author: UserId) -> Option<&Request> {
        self.requests.get(&author)
    }

    /// Move a user to `state`, creating the conversation when needed.
    pub fn set_state(&mut self, author: UserId, state: RequestState) {
        self.requests
            .entry(author)
            .or_insert_with(|| Request::new(author))
            .state = state;
    }

    /// Start (or restart) a conversation directly in `state` with a payload.
    pub fn open(&mut self, author: UserId, state: RequestState, value: impl Into<String>) {
        let request = self
            .requests
            .entry(author)
            .or_insert_with(|| Request::new(author));
        request.state = state;
        request.value = value.into();
    }

    /// Drop a user's conversation.
    pub fn remove(&mut self, author: UserId) -> Option<Request> {
        self.requests.shift_remove(&author)
    }

    /// Drop a user's conversation when it is back at the menu.
    pub fn prune(&mut self, author: UserId) {
        if self.state_of(author) == RequestState::Root {
            self.requests.shift_remove(&author);
        }
    }

    /// Number of live conversations.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no conversation is live.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Result of asking for the shared selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller already owned the selector; the original claim time stands.
    Held,
    /// The selector was free or its owner's window expired.
    Granted,
    /// Another user owns the selector and their window is still open.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SelectionOwner {
    user_id: UserId,
    claimed_at: Instant,
}

/// Exclusive, time-limited ownership of the shared selector.
#[derive(Debug, Clone)]
pub struct SelectionWindow {
    owner: Option<SelectionOwner>,
    wait: Duration,
}

impl SelectionWindow {
    /// Create a free window; owners keep exclusivity for `wait`.
    pub fn new(wait: Duration) -> Self {
        Self { owner: None, wait }
    }

    /// Current owner, expired or not.
    pub fn owner(&self) -> Option<UserId> {
        self.owner.map(|owner| owner.user_id)
    }

    /// Whether `user` is the recorded owner.
    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner() == Some(user)
    }

    /// Try to take the selector at `now`.
    pub fn claim(&mut self, user: UserId, now: Instant) -> Claim {
        match self.owner {
            Some(owner) if owner.user_id == user => Claim::Held,
            Some(owner) if now.saturating_duration_since(owner.claimed_at) < self.wait => {
                Claim::Rejected
            }
            _ => {
                self.owner = Some(SelectionOwner {
                    user_id: user,
                    claimed_at: now,
                });
                Claim::Granted
            }
        }
    }

    /// Free the selector.
    pub fn release(&mut self) {
        self.owner = None;
    }
}
