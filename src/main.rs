use std::future::IntoFuture;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use stashfind::config::Config;
use stashfind::http::{self, AppState};
use stashfind::observability;
use stashfind::store::InMemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_tracing();

    let config = Config::from_env();
    observability::init_metrics(config.metrics_port)?;

    let store = match &config.seed_file {
        Some(path) => InMemoryStore::load_seed(path)?,
        None => {
            tracing::warn!("STASHFIND_SEED_FILE not set, starting with an empty store");
            InMemoryStore::new()
        }
    };
    metrics::gauge!(observability::STASHPOINTS_LOADED).set(store.stashpoint_count() as f64);
    let store = Arc::new(store);

    let app = http::router(AppState::from_store(store));

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("stashfind listening on {addr}");
    info!("  seed_file: {}", config.seed_file.as_ref().map_or("none".to_string(), |p| p.display().to_string()));
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, drain in-flight requests
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!("shutdown signal received, draining requests...");
        let _ = signalled_tx.send(());
    })
    .into_future();

    let grace = config.shutdown_grace;
    let drain_deadline = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!("drain timeout after {}s, exiting with requests in flight", grace.as_secs());
        }
    }

    info!("stashfind stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::error!("failed to register SIGTERM handler: {e}");
                ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
