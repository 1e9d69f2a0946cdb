// WebSocket handler and stream logic for /ws/status

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::StatusSnapshot;
use crate::version::{NAME, VERSION};

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements ws_status connection count on drop (connect = +1, drop = -1).
struct WsStatusGuard(Arc<AtomicUsize>);

impl Drop for WsStatusGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_status(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.status_tx.clone();
    let conn_count = state.ws_status_connections.clone();
    let latest = state.latest.borrow().clone();
    ws.on_upgrade(move |socket| async move {
        let mut rx = tx.subscribe();
        if let Err(e) = stream_status(socket, &mut rx, conn_count, latest).await {
            tracing::info!("Status stream error: {}", e);
        }
    })
}

/// False when the client is gone or too slow to accept the frame.
async fn send(socket: &mut WebSocket, message: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(message)).await, Ok(Ok(())))
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, value: &T) -> anyhow::Result<bool> {
    let json = serde_json::to_string(value)?;
    Ok(send(socket, Message::Text(json.into())).await)
}

async fn stream_status(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<StatusSnapshot>,
    conn_count: Arc<AtomicUsize>,
    latest: Option<StatusSnapshot>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsStatusGuard(conn_count);
    tracing::info!("Client connected to status stream");

    let welcome = serde_json::json!({ "type": "info", "service": NAME, "version": VERSION });
    if !send_json(&mut socket, &welcome).await? {
        return Ok(());
    }
    if let Some(snapshot) = latest
        && !send_json(&mut socket, &snapshot).await?
    {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if !send_json(&mut socket, &snapshot).await? {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/status client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                if !send(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    Ok(())
}
