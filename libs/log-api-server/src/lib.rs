//! HTTP + WebSocket surface of the log service.
//!
//! ```text
//! POST /api/logs   ingest one record
//! GET  /api/logs   historical query
//! GET  /ws         live stream, one subscribed channel per connection
//! ```

mod http;
mod ws;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use logcast_engine::LogEngine;

#[derive(Clone)]
pub struct AppState {
    engine: LogEngine,
    /// Fired on server shutdown; open WebSocket sessions close on it.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(engine: LogEngine, shutdown: CancellationToken) -> Self {
        Self { engine, shutdown }
    }

    pub fn engine(&self) -> &LogEngine {
        &self.engine
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/logs", get(http::handle_query_logs).post(http::handle_submit_log))
        .route("/ws", get(ws::handle_ws))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` fires.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), String> {
    let shutdown = state.shutdown.clone();
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))
}
