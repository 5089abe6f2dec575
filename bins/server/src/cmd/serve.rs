use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use logcast_api::LogStore;
use logcast_api_server::AppState;
use logcast_engine::LogEngine;
use storage_file::FileLogStore;
use storage_memory::MemoryLogStore;

use crate::config::{ServeArgs, ServerConfig, StorageConfig};
use crate::error::ServerError;

fn build_store(config: &StorageConfig) -> Arc<dyn LogStore> {
    match config {
        StorageConfig::Memory(cfg) => Arc::new(MemoryLogStore::from_config(cfg)),
        StorageConfig::File(cfg) => Arc::new(FileLogStore::from_config(cfg)),
    }
}

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    // --- Load config ---
    let config = match &args.config {
        Some(path) => {
            let config = ServerConfig::load(path)?;
            tracing::info!(config = %path, "loaded config");
            config
        }
        None => {
            tracing::info!("no config file given, using defaults");
            ServerConfig::default()
        }
    };

    // --- Store ---
    let store = build_store(&config.storage);
    store.init().await?;
    tracing::info!(storage = config.storage.kind(), "log store ready");

    let delivery = config.delivery.to_delivery_config();
    let engine = LogEngine::new(store.clone(), delivery);
    tracing::info!(
        retry_interval_ms = config.delivery.retry_interval_ms,
        warn_after_retries = delivery.warn_after_retries,
        "log engine ready"
    );

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- API server (HTTP + WS) ---
    let addr = format!("{}:{}", config.bind_addr, config.api_port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;
    let state = AppState::new(engine.clone(), token.clone());
    let mut api_handle = tokio::spawn(async move {
        if let Err(e) = logcast_api_server::serve(listener, state).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    tracing::info!(addr = %addr, "api server (http+ws) listening");
    tracing::info!("server ready");

    // --- Ожидание Ctrl+C ---
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("shutting down...");
        }
        _ = &mut api_handle => {
            tracing::warn!("api server stopped unexpectedly, shutting down");
        }
    }

    token.cancel();

    // Drain: wait up to the grace period for open sessions to close
    let grace = Duration::from_millis(config.shutdown_grace_ms);
    if !api_handle.is_finished() && tokio::time::timeout(grace, &mut api_handle).await.is_err() {
        tracing::warn!(grace_ms = config.shutdown_grace_ms, "api server did not stop in time, aborting");
        api_handle.abort();
    }

    tracing::info!(
        connections = engine.hub.connection_count().await,
        "api server stopped"
    );

    if let Err(e) = store.flush().await {
        tracing::error!(error = ?e, "store flush error");
    }

    tracing::info!("shutdown complete");
    Ok(())
}
