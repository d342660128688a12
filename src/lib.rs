// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns

//! Discovers repositories on a version control provider, clones each one,
//! finds its effx service descriptors and syncs them to the effx registry.

pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod repository;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::{Config, ControllerConfig, GitHubConfig, GitLabConfig, RegistryConfig};
pub use discovery::{DiscoverySource, Emitter, GitHubApi, GitLabApi, ProviderApi, ProviderSource};
pub use error::{ConnectError, Result};
pub use models::{LanguageInfo, RepositoryRef, SyncPayload};
pub use pipeline::{Controller, Processor, RepositoryProcessor, RunOutcome, RunState, RunSummary};
pub use registry::{HttpRegistry, Registry};
pub use repository::{
    Cloner, Credentials, FileScanner, GitCloner, ManifestInferrer, MetadataInferrer, NoopInferrer,
    TargetMatcher,
};
pub use utils::{Telemetry, VersionInfo};
