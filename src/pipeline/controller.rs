// file: src/pipeline/controller.rs
// description: wires one discovery source to a pool of workers for a single run
// reference: producer drives the channel synchronously, workers drain it

use crate::config::ControllerConfig;
use crate::discovery::{DiscoverySource, Emitter};
use crate::error::{ConnectError, Result};
use crate::pipeline::processor::Processor;
use crate::pipeline::progress::RunSummary;
use crate::pipeline::worker::{Dispatch, run_worker};
use crate::utils::telemetry::{OperationTimer, Telemetry};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub state: RunState,
    pub summary: RunSummary,
}

pub struct Controller {
    workers: usize,
    source: Arc<dyn DiscoverySource>,
    processor: Arc<dyn Processor>,
    telemetry: Telemetry,
    state: Mutex<RunState>,
}

impl Controller {
    pub fn new(
        config: &ControllerConfig,
        source: Arc<dyn DiscoverySource>,
        processor: Arc<dyn Processor>,
        telemetry: Telemetry,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            workers: config.workers,
            source,
            processor,
            telemetry,
            state: Mutex::new(RunState::Idle),
        })
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Performs a single pass over everything the source discovers.
    ///
    /// Once discovery returns the dispatch channel is closed and the call
    /// waits for every worker to exit, so items already handed off finish
    /// before this returns. Cancelling `parent` stops discovery and lets idle
    /// workers exit; a worker in the middle of a repository completes it.
    pub async fn run(&self, parent: &CancellationToken) -> Result<RunOutcome> {
        if self.state() != RunState::Idle {
            return Err(ConnectError::Config("controller has already run".to_string()));
        }

        let cancel = parent.child_token();
        let (tx, dispatch) = Dispatch::channel();
        let timer = OperationTimer::new("discovery run");

        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(
                run_worker(
                    id,
                    dispatch.clone(),
                    Arc::clone(&self.processor),
                    cancel.clone(),
                    self.telemetry.clone(),
                )
                .instrument(self.telemetry.worker_span(id)),
            );
        }
        drop(dispatch);

        self.set_state(RunState::Running);
        info!(source = self.source.name(), workers = self.workers, "run started");

        let emitter = Emitter::new(tx, cancel.clone());
        let discovered = self
            .source
            .discover(&emitter, &self.telemetry)
            .instrument(self.telemetry.discovery_span(self.source.name()))
            .await;
        // cancels that land while workers drain do not change the outcome
        let cancelled_during_discovery = cancel.is_cancelled();
        drop(emitter);

        if discovered.is_err() {
            cancel.cancel();
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task failed");
            }
        }

        let state = match &discovered {
            Err(_) => RunState::Failed,
            Ok(()) if cancelled_during_discovery => RunState::Cancelled,
            Ok(()) => RunState::Completed,
        };
        self.set_state(state);

        let summary = self.telemetry.stats().get_summary();
        timer.finish_with_count(summary.repositories_processed);
        info!(
            state = ?state,
            discovered = summary.repositories_discovered,
            processed = summary.repositories_processed,
            failed = summary.repositories_failed,
            files_synced = summary.files_synced,
            files_failed = summary.files_failed,
            scopes_failed = summary.scopes_failed,
            "run finished"
        );

        match discovered {
            Ok(()) => Ok(RunOutcome { state, summary }),
            Err(e) => {
                warn!(error = %e, "discovery failed");
                Err(e)
            }
        }
    }
}
