// ============================
// talentlobby-backend-lib/src/ws_router.rs
// ============================
//! WebSocket upgrade and connection handling.
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use talentlobby_common::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;

use crate::websocket::WebSocketHandler;
use crate::AppState;

/// Handler for WebSocket connections
pub async fn ws_handler<S: Send + Sync + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection<S: Send + Sync + 'static>(socket: WebSocket, state: Arc<AppState<S>>) {
    let (mut sink, mut stream) = socket.split();

    // Every event for this socket goes through one channel, keeping emission order
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let socket_id = state.hub.connect(tx);
    let handler = WebSocketHandler::new(state.clone(), socket_id.clone());

    // Forward hub events to the WebSocket
    let writer_id = socket_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(socket_id = %writer_id, event = event.name(), error = %e, "failed to encode event");
                    continue;
                },
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Process incoming frames strictly in order
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => {
                    if let Err(e) = handler.handle_event(event).await {
                        tracing::debug!(socket_id = %socket_id, error = %e, "client event rejected");
                        handler.send_error(e.error_code(), e.public_message());
                    }
                },
                Err(e) => {
                    tracing::debug!(socket_id = %socket_id, error = %e, "malformed frame");
                    handler.send_error("WS_001", format!("malformed event: {e}"));
                },
            },
            Message::Close(_) => break,
            _ => {}, // ping/pong handled by axum, binary frames are not part of the protocol
        }
    }

    state.hub.disconnect(&socket_id);
    send_task.abort();
}
