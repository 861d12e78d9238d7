use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Shutdown signalling for pipeline runs
///
/// Workers subscribe to a watch channel and check it between jobs: on a
/// signal they finish the in-flight job, log what they left unprocessed and
/// return their tally. Unprocessed jobs stay selectable for the next run,
/// so stopping early never loses work permanently.
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Listen for CTRL+C or SIGTERM and broadcast the stop signal
pub fn spawn_signal_listener(shutdown_tx: watch::Sender<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received CTRL+C signal, stopping workers after in-flight jobs...");
            }
            _ = terminate => {
                info!("Received SIGTERM signal, stopping workers after in-flight jobs...");
            }
        }

        // Send fails only when the run already finished and dropped all
        // receivers, which is fine.
        let _ = shutdown_tx.send(true);
    })
}

/// Broadcast the stop signal once the run deadline elapses
pub fn spawn_deadline(shutdown_tx: watch::Sender<bool>, deadline: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        warn!(
            "Run deadline of {}s reached, stopping workers after in-flight jobs...",
            deadline.as_secs()
        );
        let _ = shutdown_tx.send(true);
    })
}
