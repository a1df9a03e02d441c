//! WebSocket endpoint for live delivery.
//!
//! One connection gets a recv/send task pair. Outbound events flow
//! through an unbounded channel registered with the room registry, so
//! broadcasts from any request (REST or socket) reach this connection
//! without touching the socket from foreign tasks. Each inbound event is
//! handled to completion before the next is read; errors are reported on
//! this connection only and never tear it down.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Extension, Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use huddle_messaging::{ClientEvent, ConnectionId, MessagingError, RoomId, ServerEvent};

use crate::middleware::CallerIdentity;
use crate::state::GatewayState;

/// Create all WebSocket routes
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/ws", get(websocket_handler))
}

/// WebSocket connection handler. Identity was resolved by the shared
/// middleware (query parameter for browser clients).
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, identity: CallerIdentity) {
    let (mut sink, mut stream) = socket.split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection_id = state.registry.register(outbound_tx.clone());
    debug!(connection_id, user = %identity.public_id, "websocket connected");

    let _ = outbound_tx.send(ServerEvent::Hello {
        user_id: identity.public_id.clone(),
    });

    // Send task: drains the outbound queue onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(error) => warn!(?error, "failed to serialize server event"),
            }
        }
    });

    // Recv task: one inbound event at a time, handled to completion.
    let recv_state = state.clone();
    let recv_identity = identity.clone();
    let recv_outbound = outbound_tx.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            let Ok(message) = message else { break };
            match message {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(error) => {
                            let _ = recv_outbound.send(ServerEvent::Error {
                                error: "VALIDATION".to_string(),
                                message: format!("unrecognized event: {error}"),
                            });
                            continue;
                        }
                    };
                    handle_client_event(
                        event,
                        &recv_state,
                        &recv_identity,
                        connection_id,
                        &recv_outbound,
                    )
                    .await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.registry.unregister(connection_id);
    debug!(connection_id, user = %identity.public_id, "websocket disconnected");
}

async fn handle_client_event(
    event: ClientEvent,
    state: &Arc<GatewayState>,
    identity: &CallerIdentity,
    connection_id: ConnectionId,
    outbound: &mpsc::UnboundedSender<ServerEvent>,
) {
    match event {
        ClientEvent::Ping => {
            let _ = outbound.send(ServerEvent::Pong);
        }
        ClientEvent::JoinConversation { conversation_id } => {
            match state
                .delivery
                .authorize_conversation(&conversation_id, identity.user_id)
                .await
            {
                Ok(conversation) => {
                    state
                        .registry
                        .join(RoomId::Conversation(conversation.public_id), connection_id);
                    let _ = outbound.send(ServerEvent::JoinedConversation { conversation_id });
                }
                Err(error) => send_error(outbound, &error),
            }
        }
        ClientEvent::JoinChannel { channel_id } => {
            match state
                .delivery
                .authorize_channel(&channel_id, identity.user_id)
                .await
            {
                Ok(channel) => {
                    state
                        .registry
                        .join(RoomId::Channel(channel.public_id), connection_id);
                    let _ = outbound.send(ServerEvent::JoinedChannel { channel_id });
                }
                Err(error) => send_error(outbound, &error),
            }
        }
        ClientEvent::LeaveChannel { channel_id } => {
            // Leaving needs no authorization; it only shrinks delivery.
            state
                .registry
                .leave(&RoomId::Channel(channel_id.clone()), connection_id);
            let _ = outbound.send(ServerEvent::LeftChannel { channel_id });
        }
        ClientEvent::SendDmMessage {
            conversation_id,
            content,
        } => {
            // The broadcast inside send_dm reaches this connection too if
            // it has joined the room; no separate acknowledgement is sent.
            if let Err(error) = state
                .delivery
                .send_dm(
                    &conversation_id,
                    identity.user_id,
                    &content,
                    huddle_database::MessageType::Text,
                    None,
                )
                .await
            {
                send_error(outbound, &error);
            }
        }
    }
}

fn send_error(outbound: &mpsc::UnboundedSender<ServerEvent>, error: &MessagingError) {
    let _ = outbound.send(ServerEvent::Error {
        error: error.code().to_string(),
        message: error.to_string(),
    });
}
