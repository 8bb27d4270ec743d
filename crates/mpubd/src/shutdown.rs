//! Maps process signals onto a cancellation token.
//!
//! SIGINT, SIGTERM and SIGQUIT all mean "withdraw the records and exit".

use std::io;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Waits for the first shutdown signal and returns its name.
pub async fn wait_for_shutdown_signal() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigquit = signal(SignalKind::quit())?;

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
            _ = sigquit.recv() => "SIGQUIT",
        };
        Ok(name)
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }
}

/// Spawns a task that cancels `token` on the first shutdown signal.
///
/// The task also exits quietly if the token is cancelled some other way.
pub fn spawn_signal_handler(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = wait_for_shutdown_signal() => {
                match result {
                    Ok(signal) => info!(signal, "Exiting on signal"),
                    Err(e) => error!(error = %e, "Error waiting for shutdown signal"),
                }
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}

/// Waits for the task from [`spawn_signal_handler`], logging it if the task
/// panicked or was aborted.
pub async fn join_signal_handler(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!(error = %e, "Signal handler task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handler_exits_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let handle = spawn_signal_handler(token.clone());

        token.cancel();

        let joined = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(joined.is_ok(), "signal task should stop once the token is cancelled");
    }

    #[tokio::test]
    async fn test_join_reports_aborted_handler_without_panicking() {
        let token = CancellationToken::new();
        let handle = spawn_signal_handler(token.clone());
        handle.abort();

        tokio::time::timeout(Duration::from_secs(1), join_signal_handler(handle))
            .await
            .unwrap();
        assert!(!token.is_cancelled());
    }
}
