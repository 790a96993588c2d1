//! Server startup: store selection, shared state and the HTTP listener.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use emogo_core::config::StoreBackend;
use emogo_core::Config;
use emogo_storage::MediaStore;

use crate::record_store::{MemoryRecordStore, PgRecordStore, RecordStore};
use crate::router::build_router;
use crate::state::AppState;
use crate::db;

/// Open the configured record store. PostgreSQL connections run pending
/// migrations before the store is handed out.
pub async fn open_record_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory record store; records are lost on restart");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = db::connect(&config.store)
                .await
                .context("failed to connect to the record store")?;
            Ok(Arc::new(PgRecordStore::new(pool)))
        }
    }
}

pub async fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let records = open_record_store(config).await?;
    let media = MediaStore::from_config(&config.media).context("failed to open media store")?;
    info!(store = records.backend_name(), media = %media.describe(), "Stores ready");

    Ok(Arc::new(AppState {
        records,
        media: Arc::new(media),
        ingest: config.ingest.clone(),
    }))
}

/// Bind the listener and serve until Ctrl-C.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = build_app_state(config).await?;
    let app = build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
