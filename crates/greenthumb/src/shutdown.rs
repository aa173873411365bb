//! Termination signal handling.

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::info;

/// Listen for SIGTERM and SIGINT.
///
/// The returned receiver flips to `true` on the first signal. Handlers are
/// installed before this returns, so a signal that arrives right after is
/// not lost.
pub fn install_shutdown_handler() -> std::io::Result<watch::Receiver<bool>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!(signal = "SIGTERM", "received shutdown signal"),
            _ = sigint.recv() => info!(signal = "SIGINT", "received shutdown signal"),
        }
        let _ = shutdown_tx.send(true);
        // Keep the sender alive so receivers see `true`, not a closed channel.
        shutdown_tx.closed().await;
    });

    Ok(shutdown_rx)
}
