use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

/// Let the worker finish queued deliveries, aborting it after twice `grace`.
pub async fn drain_worker(worker: JoinHandle<()>, grace: Duration) {
    tracing::info!("Waiting for queued deliveries...");

    let limit = grace.saturating_mul(2);
    let abort = worker.abort_handle();
    match tokio::time::timeout(limit, worker).await {
        Ok(Ok(())) => tracing::info!("Graceful shutdown complete"),
        Ok(Err(e)) => tracing::error!(error = %e, "Delivery worker panicked"),
        Err(_) => {
            tracing::warn!(limit = ?limit, "Delivery worker still busy, aborting");
            abort.abort();
        }
    }
}
