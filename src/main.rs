use std::sync::Arc;

use recycle_dispatch::api::rest::router;
use recycle_dispatch::config::{Config, LogFormat, StoreBackend};
use recycle_dispatch::error::AppError;
use recycle_dispatch::state::AppState;
use recycle_dispatch::store::{MemoryStore, PgStore, Store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            tracing::info!(
                host = %config.database.host,
                port = config.database.port,
                database = %config.database.name,
                "using postgres store"
            );
            Arc::new(PgStore::connect_lazy(&config.database))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory demo store, data is lost on shutdown");
            Arc::new(MemoryStore::demo())
        }
    };

    let state = AppState::new(store).with_static_dir(config.static_dir.clone());
    let app = router(Arc::new(state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
