// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;
pub mod signals;
pub mod telemetry;
pub mod version;

pub use telemetry::{OperationTimer, Telemetry};
pub use version::VersionInfo;
