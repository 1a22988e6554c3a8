use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    services::control::{Collaborators, Control, ControlSettings},
    state::{
        ids::{ChannelId, GroupId, Member, SurfaceId},
        notifier::Notifier,
        requests::{ChatMessage, UserInput},
    },
    transport::UiTransport,
};

/// Inbound events of one group, in arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A reaction on one of the group's surfaces.
    Reaction {
        /// Surface the reaction landed on.
        surface: SurfaceId,
        /// Reaction emoji.
        emoji: String,
        /// Reacting user.
        user: Member,
    },
    /// A message in the group's dedicated channel.
    Message(ChatMessage),
    /// The voice side finished the current track.
    TrackEnded,
}

/// Sending half of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionEvent>,
    channel_id: ChannelId,
}

impl SessionHandle {
    /// Queue an event; `false` once the session task is gone.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Text channel the session is bound to.
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Whether the session task stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One group's engine, run as its own task so events of a group are handled
/// one after another.
pub struct MusicServer {
    group_id: GroupId,
    channel_id: ChannelId,
    ui: Arc<dyn UiTransport>,
    control: Control,
}

impl MusicServer {
    /// Compose a session for a group bound to its dedicated text channel.
    pub fn new(
        group_id: GroupId,
        channel_id: ChannelId,
        collaborators: Collaborators,
        settings: ControlSettings,
    ) -> Self {
        let ui = collaborators.ui.clone();
        let notifier = Notifier::new(ui.clone());
        Self {
            group_id,
            channel_id,
            control: Control::new(channel_id, collaborators, settings, notifier),
            ui,
        }
    }

    /// Render the surfaces behind a temporary notice.
    pub async fn setup(&mut self) {
        self.control
            .send_notification("Initializing, please wait...")
            .await;
        self.control.setup().await;
        self.control.clear_notification().await;
        info!(group_id = %self.group_id, channel_id = %self.channel_id, "session ready");
    }

    /// Handle one event.
    pub async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Reaction {
                surface,
                emoji,
                user,
            } => {
                let owned = self.control.owns_surface(surface);
                let user_id = user.id;
                self.control
                    .process_input(UserInput::Reaction {
                        surface,
                        emoji: emoji.clone(),
                        user,
                    })
                    .await;
                if owned {
                    if let Err(err) = self.ui.remove_reaction(surface, emoji, user_id).await {
                        warn!(group_id = %self.group_id, error = %err, "failed to remove reaction");
                    }
                }
            }
            SessionEvent::Message(message) => {
                self.control.process_input(UserInput::Message(message)).await;
            }
            SessionEvent::TrackEnded => self.control.song_ended().await,
        }
    }

    /// Set up, then handle events until every handle is dropped.
    pub async fn run(mut self, mut events: UnboundedReceiver<SessionEvent>) {
        self.setup().await;
        while let Some(event) = events.recv().await {
            debug!(group_id = %self.group_id, ?event, "session event");
            self.handle(event).await;
        }
        info!(group_id = %self.group_id, "session closed");
    }

    /// Start the session task.
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle {
            tx,
            channel_id: self.channel_id,
        };
        tokio::spawn(self.run(rx));
        handle
    }
}
