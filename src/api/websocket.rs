//! WebSocket handler for real-time message status streaming

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::{
    state::ApiState,
    types::{MessageBody, StreamEvent},
};

/// WebSocket upgrade handler
///
/// GET /events
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

fn frame(event: &StreamEvent) -> Option<WsMessage> {
    serde_json::to_string(event).ok().map(WsMessage::Text)
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: ApiState) {
    info!("WebSocket client connected");

    let (mut sender, mut receiver) = socket.split();

    // Subscribe before greeting so no update after "connected" is missed
    let mut message_rx = state.message_tx.subscribe();

    if let Some(hello) = frame(&StreamEvent::Connected)
        && sender.send(hello).await.is_err()
    {
        debug!("WebSocket send failed, client disconnected");
        return;
    }

    // Spawn task to forward message updates to WebSocket
    let mut send_task = tokio::spawn(async move {
        loop {
            match message_rx.recv().await {
                Ok(message) => {
                    let event = StreamEvent::MessageUpdate {
                        message: MessageBody::from(&message),
                    };

                    if let Some(update) = frame(&event)
                        && sender.send(update).await.is_err()
                    {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client lagged, skipped {skipped} updates");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Incoming frames are only watched for the close handshake
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let WsMessage::Close(_) = msg {
                break;
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    info!("WebSocket client disconnected");
}
