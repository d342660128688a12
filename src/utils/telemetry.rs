// file: src/utils/telemetry.rs
// description: logging and counter handle passed explicitly through the run
// reference: tracing spans as parents for per-worker and per-repository spans

use crate::pipeline::progress::RunStats;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Span, info, info_span, warn};

/// Handed to the controller, each worker and the processor. Clones share
/// the same counters and parent span.
#[derive(Debug, Clone)]
pub struct Telemetry {
    span: Span,
    stats: Arc<RunStats>,
}

impl Telemetry {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            stats: Arc::new(RunStats::new()),
        }
    }

    /// No parent span; counters still work. Used by tests.
    pub fn disabled() -> Self {
        Self::new(Span::none())
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn discovery_span(&self, source: &str) -> Span {
        info_span!(parent: &self.span, "discovery", source)
    }

    pub fn worker_span(&self, worker: usize) -> Span {
        info_span!(parent: &self.span, "worker", worker)
    }

    pub fn repository_span(&self, clone_url: &str) -> Span {
        info_span!("repository", repository = clone_url)
    }
}

/// Operation timer for performance tracking
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        info!("Starting operation: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed operation: {} - {} items in {:.2}s ({:.2} items/sec)",
            self.operation,
            count,
            elapsed.as_secs_f64(),
            if elapsed.as_secs_f64() > 0.0 {
                count as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            }
        );
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration, message: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "Slow operation [{}]: {} took {:.2}s (threshold: {:.2}s)",
                self.operation,
                message,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}
