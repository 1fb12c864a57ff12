//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT (Ctrl+C) and, on Unix, SIGTERM
//! - Combine them with the in-process [`Shutdown`](super::Shutdown) broadcast
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A signal handler that fails to install is logged, never fatal

use tokio::sync::broadcast;

/// Resolve once the process is interrupted or `shutdown` fires.
///
/// A closed channel counts as a shutdown: the coordinator is gone.
pub async fn wait_for_shutdown(mut shutdown: broadcast::Receiver<()>) {
    tokio::select! {
        _ = ctrl_c() => tracing::info!("Shutdown signal received"),
        _ = terminate() => tracing::info!("Terminate signal received"),
        _ = shutdown.recv() => tracing::info!("Shutdown requested"),
    }
}

async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(error) => {
            tracing::warn!(error = %error, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolves_on_trigger() {
        let shutdown = Shutdown::new();
        let waiting = tokio::spawn(wait_for_shutdown(shutdown.subscribe()));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("wait_for_shutdown did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_resolves_when_coordinator_dropped() {
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        drop(shutdown);

        tokio::time::timeout(Duration::from_secs(1), wait_for_shutdown(rx))
            .await
            .expect("wait_for_shutdown did not resolve");
    }
}
