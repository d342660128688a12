// file: src/discovery/mod.rs
// description: discovery source abstraction and cancellable hand-off to workers
// reference: single producer feeding a bounded dispatch channel

pub mod github;
pub mod gitlab;
pub mod pagination;
pub mod provider;

use crate::error::Result;
use crate::models::RepositoryRef;
use crate::utils::telemetry::Telemetry;
use async_trait::async_trait;
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use github::GitHubApi;
pub use gitlab::GitLabApi;
pub use pagination::{Page, PAGE_SIZE, collect_pages};
pub use provider::{ProviderApi, ProviderSource};

/// Enumerates repositories and hands each one to the emitter until it runs
/// out of scopes or the run is cancelled. Cancellation is not an error.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    fn name(&self) -> &str;

    async fn discover(&self, emitter: &Emitter, telemetry: &Telemetry) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    Delivered,
    /// The run was cancelled or every worker is gone; stop emitting.
    Stopped,
}

/// Sending half of the dispatch channel, raced against cancellation.
#[derive(Debug, Clone)]
pub struct Emitter {
    tx: mpsc::Sender<RepositoryRef>,
    cancel: CancellationToken,
}

impl Emitter {
    pub fn new(tx: mpsc::Sender<RepositoryRef>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Blocks until a worker slot is free or the run is cancelled.
    pub async fn emit(&self, repository: RepositoryRef) -> Emission {
        if self.cancel.is_cancelled() {
            return Emission::Stopped;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Emission::Stopped,
            sent = self.tx.send(repository) => match sent {
                Ok(()) => Emission::Delivered,
                Err(_) => Emission::Stopped,
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `fut` unless the run is cancelled first.
    pub async fn until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            output = fut => Some(output),
        }
    }
}
