use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::gateway::{FrameError, GatewayInbound, GatewayOutbound, PROTOCOL_VERSION},
    services::music_server::SessionEvent,
    state::{SharedState, ids::GroupId, requests::ChatMessage},
    transport::gateway::BridgeConnection,
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Internal error type for bridge frame handling.
///
/// Distinct from `AppError`, which only covers the HTTP upgrade.
#[derive(Debug, Error)]
enum GatewayError {
    /// The frame could not be parsed or validated.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The first frame was something other than an identification.
    #[error("first frame was not identification")]
    NotIdentified,
    /// The bridge speaks another protocol version.
    #[error("protocol version mismatch (expected {expected}, got {got})")]
    VersionMismatch { expected: u32, got: u32 },
    /// Another bridge holds the link.
    #[error("a bridge is already connected")]
    AlreadyConnected,
    /// Event for a group that was never set up.
    #[error("no session for group `{0}`")]
    UnknownGroup(GroupId),
}

/// Handle the full lifecycle of the bridge WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound frames flowing while we await inbound ones.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "gateway receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("gateway identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let bridge = match identify(&initial_message) {
        Ok(bridge) => bridge,
        Err(err) => {
            warn!(error = %err, "rejecting bridge");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let connection_id = Uuid::new_v4();
    let attached = state
        .gateway()
        .attach(BridgeConnection {
            id: connection_id,
            tx: outbound_tx.clone(),
        })
        .await;
    if !attached {
        warn!(%bridge, error = %GatewayError::AlreadyConnected, "rejecting bridge");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }
    info!(%bridge, %connection_id, "bridge connected");

    let welcome = GatewayOutbound::Welcome {
        protocol_version: PROTOCOL_VERSION,
        channel_name: state.config().channel_name().to_string(),
    };
    if let Err(err) = state.gateway().send(&welcome).await {
        warn!(%bridge, error = %err, "failed to greet bridge, terminating");
        state.gateway().detach(connection_id).await;
        finalize(writer_task, outbound_tx).await;
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(%bridge, payload = %text, "received gateway frame");
                if let Err(err) = handle_frame(&state, &text) {
                    warn!(%bridge, error = %err, "gateway frame dropped");
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%bridge, "bridge closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%bridge, error = %err, "gateway websocket error");
                break;
            }
        }
    }

    state.gateway().detach(connection_id).await;
    state.close_sessions();
    info!(%bridge, "bridge disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Validate the identification frame, returning the bridge name.
fn identify(raw: &str) -> Result<String, GatewayError> {
    let GatewayInbound::Identification(frame) = GatewayInbound::from_json_str(raw)? else {
        return Err(GatewayError::NotIdentified);
    };
    if frame.protocol_version != PROTOCOL_VERSION {
        return Err(GatewayError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            got: frame.protocol_version,
        });
    }
    Ok(frame.bridge)
}

/// Route one frame of an identified bridge.
fn handle_frame(state: &SharedState, raw: &str) -> Result<(), GatewayError> {
    match GatewayInbound::from_json_str(raw)? {
        GatewayInbound::Identification(_) => {
            warn!("ignoring duplicate identification frame");
            Ok(())
        }
        GatewayInbound::Setup(frame) => {
            state.ensure_session(frame.group_id, frame.channel_id);
            Ok(())
        }
        GatewayInbound::ReactionAdded(frame) => {
            if frame.user.bot {
                return Ok(());
            }
            route(
                state,
                frame.group_id,
                SessionEvent::Reaction {
                    surface: frame.surface_id,
                    emoji: frame.emoji,
                    user: frame.user,
                },
            )
        }
        GatewayInbound::MessageCreated(frame) => {
            if frame.author.bot {
                return Ok(());
            }
            route(
                state,
                frame.group_id,
                SessionEvent::Message(ChatMessage {
                    id: frame.message_id,
                    channel_id: frame.channel_id,
                    content: frame.content,
                    author: frame.author,
                }),
            )
        }
        GatewayInbound::TrackEnded(frame) => route(state, frame.group_id, SessionEvent::TrackEnded),
    }
}

fn route(state: &SharedState, group_id: GroupId, event: SessionEvent) -> Result<(), GatewayError> {
    if state.route_to_session(group_id, event) {
        Ok(())
    } else {
        Err(GatewayError::UnknownGroup(group_id))
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
