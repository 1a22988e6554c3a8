use std::sync::Arc;

use axum::extract::ws::Message;
use futures::future::BoxFuture;
use tokio::sync::{RwLock, mpsc::UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::gateway::GatewayOutbound,
    state::{
        ids::{ChannelId, GroupId, MessageId, SurfaceId, UserId},
        track::Track,
    },
    transport::{TransportError, TransportResult, UiTransport, VoiceTransport},
};

/// Writer half of the connected bridge.
#[derive(Debug, Clone)]
pub struct BridgeConnection {
    /// Connection identity, so a stale socket cannot detach its successor.
    pub id: Uuid,
    /// Channel feeding the socket writer task.
    pub tx: UnboundedSender<Message>,
}

/// Slot holding the single bridge connection.
#[derive(Debug, Default)]
pub struct GatewayLink {
    connection: RwLock<Option<BridgeConnection>>,
}

impl GatewayLink {
    /// Attach a bridge; refuses when another one is already attached.
    pub async fn attach(&self, connection: BridgeConnection) -> bool {
        let mut slot = self.connection.write().await;
        if slot.is_some() {
            return false;
        }
        *slot = Some(connection);
        true
    }

    /// Detach the bridge identified by `id`, if it is still the attached one.
    pub async fn detach(&self, id: Uuid) {
        let mut slot = self.connection.write().await;
        if slot.as_ref().is_some_and(|connection| connection.id == id) {
            *slot = None;
        }
    }

    /// Whether a bridge is attached.
    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Serialize a frame and hand it to the attached bridge.
    pub async fn send(&self, frame: &GatewayOutbound) -> TransportResult<()> {
        let payload = serde_json::to_string(frame).map_err(TransportError::Encode)?;
        let slot = self.connection.read().await;
        let connection = slot.as_ref().ok_or(TransportError::Disconnected)?;
        connection
            .tx
            .send(Message::Text(payload.into()))
            .map_err(|_| TransportError::Disconnected)
    }
}

/// UI and voice transport of one group, speaking through the bridge.
#[derive(Clone)]
pub struct GatewayTransport {
    link: Arc<GatewayLink>,
    group_id: GroupId,
    channel_id: ChannelId,
}

impl GatewayTransport {
    /// Bind a transport to a group and its dedicated text channel.
    pub fn new(link: Arc<GatewayLink>, group_id: GroupId, channel_id: ChannelId) -> Self {
        Self {
            link,
            group_id,
            channel_id,
        }
    }

    fn dispatch(&self, frame: GatewayOutbound) -> BoxFuture<'static, TransportResult<()>> {
        let link = self.link.clone();
        Box::pin(async move { link.send(&frame).await })
    }
}

impl UiTransport for GatewayTransport {
    fn send_surface(
        &self,
        content: String,
        reactions: Vec<String>,
    ) -> BoxFuture<'static, TransportResult<SurfaceId>> {
        let link = self.link.clone();
        let surface_id = SurfaceId::new();
        let frame = GatewayOutbound::SendSurface {
            group_id: self.group_id,
            channel_id: self.channel_id,
            surface_id,
            content,
            reactions,
        };
        Box::pin(async move {
            link.send(&frame).await?;
            debug!(%surface_id, "surface sent");
            Ok(surface_id)
        })
    }

    fn edit_surface(
        &self,
        surface: SurfaceId,
        content: String,
    ) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::EditSurface {
            group_id: self.group_id,
            surface_id: surface,
            content,
        })
    }

    fn delete_surface(&self, surface: SurfaceId) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::DeleteSurface {
            group_id: self.group_id,
            surface_id: surface,
        })
    }

    fn delete_message(&self, message: MessageId) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::DeleteMessage {
            group_id: self.group_id,
            channel_id: self.channel_id,
            message_id: message,
        })
    }

    fn remove_reaction(
        &self,
        surface: SurfaceId,
        emoji: String,
        user: UserId,
    ) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::RemoveReaction {
            group_id: self.group_id,
            surface_id: surface,
            emoji,
            user_id: user,
        })
    }
}

impl VoiceTransport for GatewayTransport {
    fn connect(&self, channel: ChannelId) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::VoiceConnect {
            group_id: self.group_id,
            channel_id: channel,
        })
    }

    fn play(&self, track: Track) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::VoicePlay {
            group_id: self.group_id,
            track,
        })
    }

    fn pause(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::VoicePause {
            group_id: self.group_id,
        })
    }

    fn resume(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::VoiceResume {
            group_id: self.group_id,
        })
    }

    fn stop(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::VoiceStop {
            group_id: self.group_id,
        })
    }

    fn disconnect(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.dispatch(GatewayOutbound::VoiceDisconnect {
            group_id: self.group_id,
        })
    }
}
