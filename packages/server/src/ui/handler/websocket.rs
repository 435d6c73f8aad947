//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::ConnectionId,
    infrastructure::dto::websocket::ClientEvent,
    usecase::{CoordinatorError, SendReceipt},
};

use super::super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: events addressed to this
/// connection (via the rx channel) are written to its WebSocket.
///
/// # Arguments
///
/// * `rx` - Channel receiver for events addressed to this connection
/// * `sender` - WebSocket sink to send messages to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection and register it with the coordinator
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = state.coordinator.on_connect(tx).await;
    tracing::info!("Client connected as '{}'", conn);

    // Spawn a task to push events addressed to this connection
    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse client event: {}", e);
                            continue;
                        }
                    };
                    dispatch_event(&state_clone, conn, event).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", conn);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Disconnect reconciliation runs on every exit path
    state.coordinator.on_disconnect(conn).await;
}

/// Dispatch one parsed client event to the coordinator operation it maps to.
async fn dispatch_event(state: &Arc<AppState>, conn: ConnectionId, event: ClientEvent) {
    let result = match event {
        ClientEvent::UserJoin { username } => {
            state.coordinator.on_user_join(conn, &username).await
        }
        ClientEvent::JoinRoom { room } => state.coordinator.on_join_room(conn, &room).await,
        ClientEvent::LeaveRoom { room } => state.coordinator.on_leave_room(conn, &room).await,
        ClientEvent::SendMessage { message } => state
            .coordinator
            .on_send_message(conn, &message)
            .await
            .map(log_unpersisted),
        ClientEvent::SendRoomMessage { room, message } => state
            .coordinator
            .on_send_room_message(conn, &room, &message)
            .await
            .map(log_unpersisted),
        ClientEvent::PrivateMessage { to, message } => match ConnectionId::parse(&to) {
            Ok(target) => state
                .coordinator
                .on_private_message(conn, target, &message)
                .await
                .map(log_unpersisted),
            Err(e) => Err(CoordinatorError::InvalidInput(e)),
        },
        ClientEvent::Typing { room, is_typing } => {
            state.coordinator.on_typing(conn, &room, is_typing).await
        }
    };

    match result {
        Ok(()) => {}
        Err(CoordinatorError::ConnectionClosed) => {
            tracing::debug!("Dropped event from closed connection '{}'", conn);
        }
        Err(e) => {
            tracing::warn!("Rejected event from '{}': {}", conn, e);
        }
    }
}

/// Surface a persistence miss as a non-fatal warning.
fn log_unpersisted(receipt: SendReceipt) {
    if !receipt.persisted {
        tracing::warn!(
            "Message {} delivered but not persisted",
            receipt.message.seq
        );
    }
}
