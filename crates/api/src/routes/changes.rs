//! The `/changes` WebSocket: the push channel of the change feed.
//!
//! Every [`ChangeEvent`] published on the bus is serialized to JSON and
//! forwarded to every connected client. Clients filter by collection
//! themselves; the server does not track per-client interests.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::bus::ChangeBus;
use crate::state::AppState;

/// GET /api/v1/changes -- upgrades to a WebSocket carrying change events.
pub async fn changes_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, Arc::clone(&state.change_bus)))
}

/// Manage a single change-feed connection after upgrade.
///
/// A spawned sender task forwards bus events to the sink; the current task
/// drains inbound frames only to observe the close.
async fn handle_socket(socket: WebSocket, bus: Arc<ChangeBus>) {
    tracing::debug!("Change feed client connected");
    let mut rx = bus.subscribe();
    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(body) => {
                        if sink.send(Message::Text(body.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to serialize change event");
                    }
                },
                // A lagged receiver dropped events; clients recover on their
                // next full fetch.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    send_task.abort();
    tracing::debug!("Change feed client disconnected");
}
