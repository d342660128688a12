// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod controller;
pub mod processor;
pub mod progress;
pub mod worker;

pub use controller::{Controller, RunOutcome, RunState};
pub use processor::{CLONE_DEPTH, ProcessReport, Processor, RepositoryProcessor};
pub use progress::{RunStats, RunSummary};
pub use worker::{DISPATCH_CAPACITY, Dispatch, run_worker};
