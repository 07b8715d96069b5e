//! WebSocket connection handler.
//!
//! Provides the upgrade handler and the per-connection loops.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use super::connection::next_connection_id;
use super::messages::InboundMessage;
use crate::state::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_connection(socket, state))
}

/// Handles a WebSocket connection until either side ends it.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let connection_id = next_connection_id();
    // A registered connection receives every later payload.
    let notifications = state.subscribe();
    state.connections.on_connect(connection_id).await;
    state.metrics.record_connection_opened();
    info!("WebSocket client connected");

    let (ws_sender, ws_receiver) = socket.split();

    let mut send_task = tokio::spawn(forward_notifications(
        ws_sender,
        notifications,
        state.clone(),
    ));
    let mut recv_task = tokio::spawn(read_frames(ws_receiver, connection_id, state.clone()));

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.connections.on_disconnect(connection_id).await;
    state.metrics.record_connection_closed();
    info!("WebSocket client disconnected");
}

/// Pushes broadcast payloads to the client. Sends a close frame on shutdown.
async fn forward_notifications(
    mut sender: SplitSink<WebSocket, Message>,
    mut notifications: tokio::sync::broadcast::Receiver<String>,
    state: AppState,
) {
    loop {
        tokio::select! {
            received = notifications.recv() => match received {
                Ok(payload) => {
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                    state.metrics.record_message_sent();
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client lagging, skipped {} notifications", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            () = state.stop.triggered() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

/// Reads client frames until close or error.
async fn read_frames(mut receiver: SplitStream<WebSocket>, connection_id: u64, state: AppState) {
    while let Some(result) = receiver.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                handle_inbound(text.as_str().as_bytes(), connection_id, &state).await;
            }
            Message::Binary(data) => handle_inbound(&data, connection_id, &state).await,
            Message::Close(_) => {
                debug!("WebSocket close requested");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

/// Logs one inbound payload and records announced identities.
async fn handle_inbound(payload: &[u8], connection_id: u64, state: &AppState) {
    state.metrics.record_message_received();

    match InboundMessage::parse(payload) {
        InboundMessage::ClientId(client_id) => {
            info!("Client ID received: {}", client_id);
            state
                .connections
                .set_client_id(connection_id, client_id)
                .await;
        }
        InboundMessage::Other(value) => {
            info!("Received message from client: {}", value);
        }
        InboundMessage::Invalid { error, hex } => {
            state.metrics.record_invalid_message();
            error!("Failed to parse message: {}", error);
            info!("Received message from client (hex): {}", hex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_inbound_records_client_id() {
        let state = AppState::default();
        state.connections.on_connect(7).await;

        handle_inbound(
            br#"{"action":"client_id","clientId":"abc"}"#,
            7,
            &state,
        )
        .await;

        assert_eq!(state.connections.client_ids().await, vec!["abc"]);
        assert_eq!(state.metrics.messages_received(), 1);
    }

    #[tokio::test]
    async fn test_handle_inbound_subscribe_is_only_logged() {
        let state = AppState::default();
        state.connections.on_connect(8).await;

        handle_inbound(br#"{"action":"subscribe","channel":"x"}"#, 8, &state).await;

        assert!(state.connections.client_ids().await.is_empty());
        assert_eq!(state.metrics.invalid_messages(), 0);
    }

    #[tokio::test]
    async fn test_handle_inbound_invalid_json() {
        let state = AppState::default();

        handle_inbound(b"not json", 9, &state).await;

        assert_eq!(state.metrics.messages_received(), 1);
        assert_eq!(state.metrics.invalid_messages(), 1);
    }
}
