// file: src/pipeline/worker.rs
// description: dispatch channel and the worker loop consuming it
// reference: N workers sharing one receiver, each item owned by exactly one worker

use crate::models::RepositoryRef;
use crate::pipeline::processor::Processor;
use crate::utils::telemetry::Telemetry;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Items the producer may hand off before it blocks on a busy pool.
pub const DISPATCH_CAPACITY: usize = 1;

/// Receiving half of the dispatch channel, shared by every worker.
#[derive(Debug, Clone)]
pub struct Dispatch {
    rx: Arc<Mutex<mpsc::Receiver<RepositoryRef>>>,
}

impl Dispatch {
    pub fn channel() -> (mpsc::Sender<RepositoryRef>, Self) {
        let (tx, rx) = mpsc::channel(DISPATCH_CAPACITY);
        (
            tx,
            Self {
                rx: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Waits for the next repository. `None` once the run is cancelled or the
    /// producer is done and the channel is drained.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<RepositoryRef> {
        let mut rx = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            guard = self.rx.lock() => guard,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            item = rx.recv() => item,
        }
    }
}

pub async fn run_worker(
    id: usize,
    dispatch: Dispatch,
    processor: Arc<dyn Processor>,
    cancel: CancellationToken,
    telemetry: Telemetry,
) {
    debug!(worker = id, "worker started");

    while let Some(repository) = dispatch.next(&cancel).await {
        match processor.process(&repository, &telemetry).await {
            Ok(report) => {
                telemetry.stats().inc_repositories_processed();
                info!(
                    repository = repository.clone_url(),
                    files_found = report.files_found,
                    files_synced = report.files_synced,
                    files_failed = report.files_failed,
                    "consumed repository"
                );
            }
            Err(e) => {
                telemetry.stats().inc_repositories_failed();
                error!(
                    repository = repository.clone_url(),
                    error = %e,
                    "failed to consume repository"
                );
            }
        }
    }

    debug!(worker = id, "worker stopped");
}
