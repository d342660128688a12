// file: src/discovery/gitlab.rs
// description: GitLab REST v4 listing of groups and their projects
// reference: https://docs.gitlab.com/ee/api/rest/#pagination

use crate::config::GitLabConfig;
use crate::discovery::pagination::Page;
use crate::discovery::provider::{ProviderApi, get_json_page, page_url, parse_base_url};
use crate::error::{ConnectError, Result};
use crate::models::RepositoryRef;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://gitlab.com/";
const API_PATH: &str = "api/v4/";
const NEXT_PAGE_HEADER: &str = "x-next-page";

#[derive(Debug, Deserialize)]
struct Group {
    full_path: String,
}

#[derive(Debug, Deserialize)]
struct Project {
    http_url_to_repo: String,
}

pub struct GitLabApi {
    client: Client,
    base_url: Url,
}

impl GitLabApi {
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        config.validate()?;

        let base_url = api_base_url(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&config.access_token)
            .map_err(|_| ConnectError::Config("access token is not a valid header".to_string()))?;
        headers.insert("PRIVATE-TOKEN", token);
        headers.insert(USER_AGENT, HeaderValue::from_static("vcs-connect"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl ProviderApi for GitLabApi {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn scope_kind(&self) -> &'static str {
        "groups"
    }

    async fn list_scopes(&self, page: u32) -> Result<Page<String>> {
        let url = page_url(&self.base_url, &["groups"], page)?;
        let (groups, headers) = get_json_page::<Group>(&self.client, self.name(), url).await?;

        Ok(Page::new(groups, next_page(&headers)).map(|group| group.full_path))
    }

    async fn list_repositories(&self, scope: &str, page: u32) -> Result<Page<RepositoryRef>> {
        let url = page_url(&self.base_url, &["groups", scope, "projects"], page)?;
        let (projects, headers) = get_json_page::<Project>(&self.client, self.name(), url).await?;

        Ok(Page::new(projects, next_page(&headers))
            .map(|project| RepositoryRef::new(project.http_url_to_repo)))
    }
}

/// Accepts either an instance root or a url already pointing at `api/v4`.
fn api_base_url(raw: &str) -> Result<Url> {
    let base = parse_base_url(raw)?;
    if base.path().trim_end_matches('/').ends_with("api/v4") {
        return Ok(base);
    }

    base.join(API_PATH)
        .map_err(|e| ConnectError::Config(format!("invalid url {}: {}", raw, e)))
}

/// GitLab sends an empty `X-Next-Page` on the last page.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(NEXT_PAGE_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
