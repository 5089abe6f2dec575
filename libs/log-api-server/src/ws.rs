use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Deserialize;

use logcast_engine::{Connection, LogEngine, Outbox};

use super::AppState;

pub(crate) const WELCOME: &str = "Connected to Real-Time Log Stream";

// ═══════════════════════════════════════════════════════════════
//  WebSocket: /ws
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(socket, state))
}

// ═══════════════════════════════════════════════════════════════
//  Protocol types
// ═══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct RawControl {
    #[serde(default)]
    subscribe: Option<serde_json::Value>,
    #[serde(default)]
    unsubscribe: Option<serde_json::Value>,
}

/// Control message a client may send.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Control {
    /// `{"subscribe":"<channel>"}`
    Subscribe(String),
    /// `{"unsubscribe":true}`
    Unsubscribe,
    /// Valid JSON without a recognised action.
    Ignored,
}

/// Parse a text frame. `Err` means the frame is not JSON at all.
pub(crate) fn parse_control(text: &str) -> Result<Control, serde_json::Error> {
    let raw: RawControl = serde_json::from_str(text)?;
    if let Some(serde_json::Value::String(channel)) = raw.subscribe {
        if !channel.is_empty() {
            return Ok(Control::Subscribe(channel));
        }
    }
    if matches!(raw.unsubscribe, Some(serde_json::Value::Bool(true))) {
        return Ok(Control::Unsubscribe);
    }
    Ok(Control::Ignored)
}

// ═══════════════════════════════════════════════════════════════
//  Connection handler
// ═══════════════════════════════════════════════════════════════

async fn ws_connection(mut socket: WebSocket, state: AppState) {
    let engine = &state.engine;
    let (conn, mut outbox) = engine.hub.connect().await;
    let id = conn.id();
    tracing::info!(connection = id, "client connected");

    if socket.send(Message::Text(WELCOME.into())).await.is_err() {
        engine.hub.disconnect(&conn).await;
        tracing::info!(connection = id, "client disconnected before welcome");
        return;
    }
    engine.hub.open(&conn);

    loop {
        tokio::select! {
            biased;

            _ = state.shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }

            msg = socket.recv() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    _ => break,
                };

                match msg {
                    Message::Text(text) => on_text(engine, &conn, text.as_str()).await,
                    Message::Close(_) => break,
                    Message::Binary(_) => {
                        tracing::warn!(connection = id, "invalid message from client: binary frame");
                    }
                    _ => continue,
                }
            }

            frame = outbox.recv() => {
                let Some(frame) = frame else { break };
                if !write_frame(&mut socket, &outbox, frame).await {
                    break;
                }
            }
        }
    }

    engine.hub.disconnect(&conn).await;
    tracing::info!(connection = id, "client disconnected");
}

/// Write one outbound frame and report it flushed. `false` = socket gone.
async fn write_frame(socket: &mut WebSocket, outbox: &Outbox, frame: String) -> bool {
    let len = frame.len();
    let res = socket.send(Message::Text(frame.into())).await;
    outbox.flushed(len);
    res.is_ok()
}

async fn on_text(engine: &LogEngine, conn: &Arc<Connection>, text: &str) {
    let id = conn.id();
    let control = match parse_control(text) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(connection = id, error = %e, "invalid message from client");
            return;
        }
    };

    match control {
        Control::Subscribe(channel) => {
            let previous = engine.hub.subscribe(id, channel.clone()).await;
            tracing::info!(connection = id, channel = %channel, previous = ?previous, "client subscribed");
            let ack = format!("Subscribed to {channel}");
            if let Err(e) = engine.sender.send(conn, ack).await {
                tracing::warn!(connection = id, error = %e, "subscribe ack not delivered");
            }
        }
        Control::Unsubscribe => {
            let previous = engine.hub.unsubscribe(id).await;
            tracing::info!(connection = id, previous = ?previous, "client unsubscribed");
            if let Err(e) = engine.sender.send(conn, "Unsubscribed".to_string()).await {
                tracing::warn!(connection = id, error = %e, "unsubscribe ack not delivered");
            }
        }
        Control::Ignored => {
            tracing::debug!(connection = id, "client message without action ignored");
        }
    }
}
