// file: src/pipeline/processor.rs
// description: clone, scan, enrich and sync a single repository
// reference: per-item failures downgrade to logs, workspace always removed

use crate::error::{ConnectError, Result};
use crate::models::{LanguageInfo, RepositoryRef, SyncPayload};
use crate::registry::Registry;
use crate::repository::{Cloner, FileScanner, MetadataInferrer, ScannedFile, Workspace};
use crate::utils::telemetry::Telemetry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, warn};

pub const CLONE_DEPTH: u32 = 1;

const SLOW_CLONE: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub files_found: usize,
    pub files_synced: usize,
    pub files_failed: usize,
}

/// Processes one repository to completion. Only setup, clone and traversal
/// failures are returned; everything per file is logged and skipped.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, repository: &RepositoryRef, telemetry: &Telemetry) -> Result<ProcessReport>;
}

pub struct RepositoryProcessor {
    scratch_root: PathBuf,
    scanner: FileScanner,
    cloner: Arc<dyn Cloner>,
    inferrer: Arc<dyn MetadataInferrer>,
    registry: Arc<dyn Registry>,
}

impl RepositoryProcessor {
    pub fn new(
        scratch_root: PathBuf,
        scanner: FileScanner,
        cloner: Arc<dyn Cloner>,
        inferrer: Arc<dyn MetadataInferrer>,
        registry: Arc<dyn Registry>,
    ) -> Self {
        Self {
            scratch_root,
            scanner,
            cloner,
            inferrer,
            registry,
        }
    }

    async fn clone_into(&self, repository: &RepositoryRef, workspace: &Workspace) -> Result<()> {
        let cloner = Arc::clone(&self.cloner);
        let url = repository.clone_url().to_string();
        let destination = workspace.path().to_path_buf();

        let timer = crate::utils::OperationTimer::new("clone");
        let result =
            tokio::task::spawn_blocking(move || cloner.clone_repository(&url, &destination, CLONE_DEPTH))
                .await?;
        timer.warn_if_slow(SLOW_CLONE, repository.clone_url());
        result
    }

    async fn find_targets(&self, workspace: &Workspace) -> Result<Vec<ScannedFile>> {
        let scanner = self.scanner.clone();
        let root = workspace.path().to_path_buf();
        tokio::task::spawn_blocking(move || scanner.find_targets(&root)).await?
    }

    async fn infer_language(&self, dir: &Path, relative_path: &str) -> Option<LanguageInfo> {
        let inferrer = Arc::clone(&self.inferrer);
        let dir = dir.to_path_buf();

        let inferred = tokio::task::spawn_blocking(move || inferrer.infer(&dir))
            .await
            .map_err(ConnectError::from)
            .and_then(|result| result);

        match inferred {
            Ok(info) => Some(info),
            Err(e) => {
                error!(file_path = relative_path, error = %e, "failed to infer language");
                None
            }
        }
    }

    /// Returns whether the file reached the registry.
    async fn sync_target(
        &self,
        repository: &RepositoryRef,
        workspace: &Workspace,
        target: &ScannedFile,
    ) -> bool {
        let relative_path = target.relative_path.as_str();
        let dir = target.path.parent().unwrap_or(workspace.path());
        let language = self.infer_language(dir, relative_path).await;

        let contents = match tokio::fs::read(&target.path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                error!(file_path = relative_path, error = %e, "failed to read target file");
                return false;
            }
        };

        let payload = SyncPayload::builder(repository, relative_path)
            .contents(contents)
            .language(language.as_ref())
            .build();

        match self.registry.sync(&payload).await {
            Ok(()) => {
                info!(file_path = relative_path, "successfully updated target file");
                true
            }
            Err(e) => {
                error!(file_path = relative_path, error = %e, "failed to sync target file");
                false
            }
        }
    }
}

#[async_trait]
impl Processor for RepositoryProcessor {
    async fn process(&self, repository: &RepositoryRef, telemetry: &Telemetry) -> Result<ProcessReport> {
        let span = telemetry.repository_span(repository.clone_url());

        async move {
            let workspace = Workspace::create(&self.scratch_root, repository.clone_url())?;

            self.clone_into(repository, &workspace).await?;
            let targets = self.find_targets(&workspace).await?;

            let mut report = ProcessReport {
                files_found: targets.len(),
                ..Default::default()
            };

            for target in &targets {
                if self.sync_target(repository, &workspace, target).await {
                    report.files_synced += 1;
                    telemetry.stats().inc_files_synced();
                } else {
                    report.files_failed += 1;
                    telemetry.stats().inc_files_failed();
                }
            }

            if let Err(e) = self.registry.detect_services(repository, workspace.path()).await {
                warn!(error = %e, "failed to detect services");
            }

            Ok(report)
        }
        .instrument(span)
        .await
    }
}
