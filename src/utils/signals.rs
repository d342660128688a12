// file: src/utils/signals.rs
// description: translates process signals into a single cancellation of the run
// reference: https://docs.rs/tokio/latest/tokio/signal

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels `token` once `trigger` resolves. Resolving after the token was
/// already cancelled is a no-op.
pub fn cancel_on<F>(token: CancellationToken, trigger: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = trigger => {
                info!("shutdown requested, cancelling run");
                token.cancel();
            }
        }
    })
}

/// Cancels `token` on SIGINT or SIGTERM.
pub fn cancel_on_shutdown(token: CancellationToken) -> JoinHandle<()> {
    cancel_on(token, shutdown_signal())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
