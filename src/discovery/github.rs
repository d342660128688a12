// file: src/discovery/github.rs
// description: GitHub and GitHub Enterprise REST listing of organizations and repositories
// reference: https://docs.github.com/en/rest/using-the-rest-api/using-pagination-in-the-rest-api

use crate::config::GitHubConfig;
use crate::discovery::pagination::Page;
use crate::discovery::provider::{ProviderApi, get_json_page, page_url, parse_base_url};
use crate::error::{ConnectError, Result};
use crate::models::RepositoryRef;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};
use reqwest::{Client, Url};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.github.com/";

lazy_static! {
    static ref NEXT_LINK: Regex = Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).unwrap();
}

#[derive(Debug, Deserialize)]
struct Organization {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    clone_url: String,
}

pub struct GitHubApi {
    client: Client,
    base_url: Url,
    username: String,
}

impl GitHubApi {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        config.validate()?;

        let base_url = parse_base_url(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("token {}", config.access_token))
            .map_err(|_| ConnectError::Config("access token is not a valid header".to_string()))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("vcs-connect"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
        })
    }
}

#[async_trait]
impl ProviderApi for GitHubApi {
    fn name(&self) -> &'static str {
        "github"
    }

    fn scope_kind(&self) -> &'static str {
        "organizations"
    }

    async fn list_scopes(&self, page: u32) -> Result<Page<String>> {
        let url = page_url(&self.base_url, &["users", &self.username, "orgs"], page)?;
        let (orgs, headers) = get_json_page::<Organization>(&self.client, self.name(), url).await?;

        Ok(Page::new(orgs, next_page(&headers)).map(|org| org.login))
    }

    async fn list_repositories(&self, scope: &str, page: u32) -> Result<Page<RepositoryRef>> {
        let url = page_url(&self.base_url, &["orgs", scope, "repos"], page)?;
        let (repos, headers) = get_json_page::<Repository>(&self.client, self.name(), url).await?;

        Ok(Page::new(repos, next_page(&headers)).map(|repo| RepositoryRef::new(repo.clone_url)))
    }
}

/// Reads the page number of the `rel="next"` entry of a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;
    let target = NEXT_LINK.captures(link)?.get(1)?.as_str();
    let url = Url::parse(target).ok()?;

    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}
