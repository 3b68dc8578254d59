use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{error, info, warn};

use crate::{protocol::OutgoingMessage, server::AppState};

/// GET /v1/events
///
/// Streams every message board change to the client. The socket is
/// read-only; anything the client sends besides a close is ignored.
pub async fn events_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json(socket: &mut WebSocket, message: &OutgoingMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            error!("Failed to serialize event: {}", e);
            Ok(())
        }
    }
}

pub async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (subscriber, rx) = state.board.subscribe();
    info!("Event feed connected: subscriber={}", subscriber);

    let ready = OutgoingMessage::Ready {
        version: env!("CARGO_PKG_VERSION"),
    };
    if let Err(e) = send_json(&mut socket, &ready).await {
        warn!("Event feed closed before ready: subscriber={} err={}", subscriber, e);
        state.board.unsubscribe(&subscriber);
        return;
    }

    loop {
        tokio::select! {
            Ok(event) = rx.recv_async() => {
                if let Err(e) = send_json(&mut socket, &event).await {
                    error!("Socket send error: subscriber={} err={}", subscriber, e);
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: subscriber={} err={}", subscriber, e);
                        break;
                    }
                }
            }
        }
    }

    state.board.unsubscribe(&subscriber);
    info!("Event feed disconnected: subscriber={}", subscriber);
}
