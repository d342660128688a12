// file: src/registry/client.rs
// description: registry api client for config sync and service detection
// reference: https://docs.rs/reqwest

use crate::config::RegistryConfig;
use crate::error::{ConnectError, Result};
use crate::models::payload::SOURCE_NAME;
use crate::models::{RepositoryRef, SyncPayload};
use crate::registry::services::{DetectedService, detect_services, repository_name};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const API_KEY_HEADER: &str = "x-effx-api-key";

#[async_trait]
pub trait Registry: Send + Sync {
    /// Uploads one enriched target file.
    async fn sync(&self, payload: &SyncPayload) -> Result<()>;

    /// Reports the services found anywhere in a cloned repository.
    async fn detect_services(&self, repository: &RepositoryRef, workspace: &Path) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct DetectedServicesRequest<'a> {
    source: &'a str,
    repository: &'a str,
    services: &'a [DetectedService],
}

pub struct HttpRegistry {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            client: Client::builder().user_agent(SOURCE_NAME).build()?,
            base_url: api_base_url(&config.api_url)?,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ConnectError::Config(format!("invalid registry endpoint {}: {}", path, e)))
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn sync(&self, payload: &SyncPayload) -> Result<()> {
        let url = self.endpoint("v2/config")?;
        debug!(url = %url, "syncing config");

        let response = self
            .client
            .put(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(payload)
            .send()
            .await?;

        check_response(response).await
    }

    async fn detect_services(&self, repository: &RepositoryRef, workspace: &Path) -> Result<()> {
        let root = workspace.to_path_buf();
        let name = repository_name(repository.clone_url());
        let services = tokio::task::spawn_blocking(move || detect_services(&root, &name)).await??;

        if services.is_empty() {
            debug!(repository = repository.clone_url(), "no services detected");
            return Ok(());
        }

        let url = self.endpoint("v2/detected_services")?;
        let request = DetectedServicesRequest {
            source: SOURCE_NAME,
            repository: repository.clone_url(),
            services: &services,
        };

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        check_response(response).await
    }
}

/// The registry answers accepted writes with 204. Anything else carries
/// `{"message": ...}`, surfaced as-is so it reads the same in our logs as in
/// the registry's.
async fn check_response(response: Response) -> Result<()> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| parsed.message)
        .unwrap_or_default();

    if message.is_empty() {
        return Err(ConnectError::Registry(format!(
            "registry returned {}: {}",
            status,
            body.trim()
        )));
    }

    Err(ConnectError::Registry(message))
}

/// `EFFX_API_HOST` is usually a bare host, so the scheme defaults to https.
fn api_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    let normalized = if with_scheme.ends_with('/') {
        with_scheme
    } else {
        format!("{}/", with_scheme)
    };

    Url::parse(&normalized).map_err(|e| ConnectError::Config(format!("invalid api url {}: {}", raw, e)))
}
