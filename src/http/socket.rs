use super::state::AppState;
use crate::connection::ConnectionId;
use crate::error::RelayError;
use crate::router::EventRouter;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// GET /interpreter
/// Upgrade to a WebSocket carrying session events
pub async fn interpreter_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.router))
}

async fn handle_socket(socket: WebSocket, router: Arc<EventRouter>) {
    let connection_id = ConnectionId::new();
    let mut outbound = router.connect(connection_id.clone());
    info!("WebSocket connection established: {}", connection_id);

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: drain the outbound queue onto the socket, pinging periodically
    let writer_id = connection_id.clone();
    let mut writer = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        ping_interval.tick().await; // consume first immediate tick

        loop {
            tokio::select! {
                event = outbound.recv() => {
                    let Some(event) = event else { break };
                    match event.to_json() {
                        Ok(text) => {
                            if ws_tx.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => error!("Failed to encode {} for {}: {}", event.name(), writer_id, e),
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Reader: one frame at a time, so events from this connection are
    // processed in the order they arrived
    loop {
        tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => router.handle_text(&connection_id, &text).await,
                Some(Ok(Message::Binary(_))) => router.reject(
                    &connection_id,
                    &RelayError::validation("binary frames are not supported"),
                ),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ping/pong handled by axum
                Some(Err(e)) => {
                    debug!("WebSocket error on {}: {}", connection_id, e);
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    router.disconnect(&connection_id).await;
    writer.abort();

    info!("WebSocket connection closed: {}", connection_id);
}
