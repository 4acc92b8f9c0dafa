//! WebSocket endpoint clients subscribe to for live notifications.
//!
//! Each connection registers with the [`ConnectionHub`] under the caller's
//! user ID; everything the monitor pushes for that user is forwarded onto
//! the socket. The read half is only drained to detect disconnects.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::state::AppState;
use wxmon_notify::hub::ConnectionHub;

#[derive(Deserialize)]
pub struct WsParams {
    pub user_id: i64,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state.hub.clone(), params.user_id, socket))
}

async fn handle_socket(hub: std::sync::Arc<ConnectionHub>, user_id: i64, socket: WebSocket) {
    let (conn_id, mut rx) = hub.register(user_id);
    tracing::info!(user_id, conn_id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(text) => {
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // Hub side dropped the channel
                    None => break,
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by axum; client text is ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.unregister(user_id, conn_id);
    tracing::info!(user_id, conn_id, "WebSocket disconnected");
}
