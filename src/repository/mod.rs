// file: src/repository/mod.rs
// description: Repository operations module exports
// reference: Internal module structure

pub mod clone;
pub mod metadata;
pub mod scanner;
pub mod workspace;

pub use clone::{Cloner, Credentials, GitCloner};
pub use metadata::{ManifestInferrer, MetadataInferrer, NoopInferrer};
pub use scanner::{FileScanner, ScannedFile, TargetMatcher};
pub use workspace::{Workspace, hash_clone_url, workspace_path};
