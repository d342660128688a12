// file: src/discovery/provider.rs
// description: provider capability and the discovery algorithm shared by all providers
// reference: list scopes, then list repositories per scope, emitting as we go

use crate::discovery::pagination::{Page, collect_pages, PAGE_SIZE};
use crate::discovery::{DiscoverySource, Emission, Emitter};
use crate::error::{ConnectError, Result};
use crate::models::RepositoryRef;
use crate::utils::telemetry::Telemetry;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

/// Page-at-a-time access to a provider's listing endpoints.
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// What the provider calls a scope, e.g. "organizations".
    fn scope_kind(&self) -> &'static str;

    async fn list_scopes(&self, page: u32) -> Result<Page<String>>;

    async fn list_repositories(&self, scope: &str, page: u32) -> Result<Page<RepositoryRef>>;
}

/// A [`DiscoverySource`] for any [`ProviderApi`]. A non-empty allow-list
/// replaces the scope listing entirely.
pub struct ProviderSource<P> {
    api: P,
    allowed_scopes: Vec<String>,
}

impl<P: ProviderApi> ProviderSource<P> {
    pub fn new(api: P, allowed_scopes: Vec<String>) -> Self {
        let allowed_scopes = allowed_scopes
            .into_iter()
            .map(|scope| scope.trim().to_string())
            .filter(|scope| !scope.is_empty())
            .collect();

        Self {
            api,
            allowed_scopes,
        }
    }

    pub fn api(&self) -> &P {
        &self.api
    }

    pub async fn resolve_scopes(&self) -> Result<Vec<String>> {
        if !self.allowed_scopes.is_empty() {
            debug!(
                provider = self.api.name(),
                count = self.allowed_scopes.len(),
                "using configured scopes"
            );
            return Ok(self.allowed_scopes.clone());
        }

        collect_pages(|page| self.api.list_scopes(page))
            .await
            .map_err(|e| {
                ConnectError::provider(
                    self.api.name(),
                    format!("failed to discover {}: {}", self.api.scope_kind(), e),
                )
            })
    }

    pub async fn repositories(&self, scope: &str) -> Result<Vec<RepositoryRef>> {
        collect_pages(|page| self.api.list_repositories(scope, page)).await
    }
}

#[async_trait]
impl<P: ProviderApi> DiscoverySource for ProviderSource<P> {
    fn name(&self) -> &str {
        self.api.name()
    }

    async fn discover(&self, emitter: &Emitter, telemetry: &Telemetry) -> Result<()> {
        let scopes = match emitter.until_cancelled(self.resolve_scopes()).await {
            Some(scopes) => scopes?,
            None => return Ok(()),
        };

        info!(
            provider = self.api.name(),
            count = scopes.len(),
            "resolved {}",
            self.api.scope_kind()
        );

        for scope in scopes {
            info!(scope = %scope, "discovering repositories");

            let repositories = match emitter.until_cancelled(self.repositories(&scope)).await {
                Some(Ok(repositories)) => repositories,
                Some(Err(e)) => {
                    error!(scope = %scope, error = %e, "failed to discover repositories");
                    telemetry.stats().inc_scopes_failed();
                    continue;
                }
                None => return Ok(()),
            };

            for repository in repositories {
                info!(repository = repository.clone_url(), "processing repository");

                if emitter.emit(repository).await == Emission::Stopped {
                    info!(scope = %scope, "discovery stopped");
                    return Ok(());
                }
                telemetry.stats().inc_repositories_discovered();
            }
        }

        Ok(())
    }
}

/// Appends path segments to `base`, percent-encoding each one, and adds the
/// standard page query.
pub(crate) fn page_url(base: &Url, segments: &[&str], page: u32) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ConnectError::Config(format!("{} cannot be used as a base url", base)))?
        .pop_if_empty()
        .extend(segments);

    url.query_pairs_mut()
        .append_pair("per_page", &PAGE_SIZE.to_string())
        .append_pair("page", &page.to_string());

    Ok(url)
}

/// GETs a JSON array, returning it alongside the response headers so the
/// caller can read its provider's pagination hints.
pub(crate) async fn get_json_page<T: DeserializeOwned>(
    client: &Client,
    provider: &str,
    url: Url,
) -> Result<(Vec<T>, HeaderMap)> {
    debug!(provider, url = %url, "requesting page");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ConnectError::provider(provider, format!("GET {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ConnectError::provider(
            provider,
            format!("GET {} returned {}: {}", url, status, body.trim()),
        ));
    }

    let headers = response.headers().clone();
    let items = response.json::<Vec<T>>().await.map_err(|e| {
        ConnectError::provider(provider, format!("invalid response from {}: {}", url, e))
    })?;

    Ok((items, headers))
}

/// Ensures a configured base url is treated as a directory when joined.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };

    Url::parse(&normalized).map_err(|e| ConnectError::Config(format!("invalid url {}: {}", raw, e)))
}
