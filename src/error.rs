// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectError>;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} request failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Clone of {url} failed: {message}")]
    Clone { url: String, message: String },

    #[error("Workspace operation failed for {path}: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to scan {path}: {message}")]
    Scan { path: PathBuf, message: String },

    #[error("Metadata inference failed for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    #[error("{0}")]
    Registry(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ConnectError {
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Errors of this class end the run when they escape discovery. A provider
    /// error for a single scope is logged by the source and never escapes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Provider { .. })
    }
}

impl From<tokio::task::JoinError> for ConnectError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
