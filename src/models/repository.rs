// file: src/models/repository.rs
// description: discoverable repository reference produced by providers
// reference: immutable value plus builder

use std::collections::BTreeMap;
use std::sync::Arc;

pub type Labels = BTreeMap<String, String>;

/// A repository found by discovery. Tags and annotations are shared
/// read-only between the source and the worker that consumes it; consumers
/// build new maps from them instead of mutating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    clone_url: String,
    tags: Arc<Labels>,
    annotations: Arc<Labels>,
}

impl RepositoryRef {
    pub fn new(clone_url: impl Into<String>) -> Self {
        Self::builder(clone_url).build()
    }

    pub fn builder(clone_url: impl Into<String>) -> RepositoryRefBuilder {
        RepositoryRefBuilder {
            clone_url: clone_url.into(),
            tags: Labels::new(),
            annotations: Labels::new(),
        }
    }

    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }

    pub fn tags(&self) -> &Labels {
        &self.tags
    }

    pub fn annotations(&self) -> &Labels {
        &self.annotations
    }
}

#[derive(Debug)]
pub struct RepositoryRefBuilder {
    clone_url: String,
    tags: Labels,
    annotations: Labels,
}

impl RepositoryRefBuilder {
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> RepositoryRef {
        RepositoryRef {
            clone_url: self.clone_url,
            tags: Arc::new(self.tags),
            annotations: Arc::new(self.annotations),
        }
    }
}
