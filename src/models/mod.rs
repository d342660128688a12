// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod payload;
pub mod repository;

pub use payload::{LanguageInfo, SyncPayload, SyncPayloadBuilder};
pub use repository::{Labels, RepositoryRef, RepositoryRefBuilder};
