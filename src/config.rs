// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{ConnectError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET_FILE: &str = "effx.yaml";
pub const DEFAULT_API_URL: &str = "https://api.effx.io";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub registry: RegistryConfig,
    pub github: GitHubConfig,
    pub gitlab: GitLabConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub scratch_dir: PathBuf,
    pub workers: usize,
    pub disable_language_detection: bool,
    pub target_file: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("effx-vcs-connect"),
            workers: 1,
            disable_language_detection: false,
            target_file: DEFAULT_TARGET_FILE.to_string(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(ConnectError::Config(
                "a scratch dir must be provided".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(ConnectError::Config(
                "at least one worker must be configured".to_string(),
            ));
        }

        if self.target_file.trim().is_empty() {
            return Err(ConnectError::Config(
                "a target file name must be provided".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub api_url: String,
    pub api_key: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(ConnectError::Config("an api host must be provided".to_string()));
        }

        if self.api_key.is_empty() {
            return Err(ConnectError::Config("an api key must be provided".to_string()));
        }

        Ok(())
    }
}

/// GitHub or GitHub Enterprise. Enterprise needs both URLs set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub base_url: Option<String>,
    /// Only validated: Enterprise installs are configured with both URLs,
    /// but listing never uploads, so the client talks to `base_url` alone.
    pub upload_url: Option<String>,
    pub username: String,
    pub access_token: String,
    pub organizations: Vec<String>,
}

impl GitHubConfig {
    pub fn validate(&self) -> Result<()> {
        validate_credentials(&self.username, &self.access_token)?;

        if self.base_url.is_some() != self.upload_url.is_some() {
            return Err(ConnectError::Config(
                "GitHub Enterprise requires both a base url and an upload url".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitLabConfig {
    pub base_url: Option<String>,
    pub username: String,
    pub access_token: String,
    pub groups: Vec<String>,
}

impl GitLabConfig {
    pub fn validate(&self) -> Result<()> {
        validate_credentials(&self.username, &self.access_token)
    }
}

fn validate_credentials(username: &str, access_token: &str) -> Result<()> {
    if username.is_empty() {
        return Err(ConnectError::Config("a username must be provided".to_string()));
    }

    if access_token.is_empty() {
        return Err(ConnectError::Config(
            "a personal access token must be provided".to_string(),
        ));
    }

    Ok(())
}

impl Config {
    /// Layers built-in defaults, an optional TOML file and `VCS_CONNECT__*`
    /// environment variables. Command line flags are applied by the caller.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("VCS_CONNECT")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("github.organizations")
                .with_list_parse_key("gitlab.groups"),
        );

        let settings = builder
            .build()
            .map_err(|e| ConnectError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| ConnectError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.controller.validate()?;
        self.registry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.registry.api_key = "key".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.controller.workers, 1);
        assert_eq!(config.controller.target_file, "effx.yaml");
        assert!(config.controller.scratch_dir.ends_with("effx-vcs-connect"));
        assert_eq!(config.registry.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.controller.workers = 0;
        assert!(matches!(config.validate(), Err(ConnectError::Config(_))));
    }

    #[test]
    fn test_empty_scratch_dir_rejected() {
        let mut config = valid_config();
        config.controller.scratch_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = Config::default();
        assert!(config.validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_github_requires_credentials_and_paired_enterprise_urls() {
        let mut github = GitHubConfig::default();
        assert!(github.validate().is_err());

        github.username = "octocat".to_string();
        github.access_token = "token".to_string();
        assert!(github.validate().is_ok());

        github.base_url = Some("https://ghe.example.com/api/v3/".to_string());
        assert!(github.validate().is_err());

        github.upload_url = Some("https://ghe.example.com/api/uploads/".to_string());
        assert!(github.validate().is_ok());
    }

    #[test]
    fn test_gitlab_requires_token() {
        let gitlab = GitLabConfig {
            username: "someone".to_string(),
            ..Default::default()
        };
        assert!(gitlab.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vcs-connect.toml");
        fs::write(
            &path,
            r#"
[controller]
workers = 4
scratch_dir = "/var/tmp/scratch"

[registry]
api_key = "secret"

[github]
username = "octocat"
organizations = ["acme", "initech"]
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.controller.workers, 4);
        assert_eq!(config.controller.scratch_dir, PathBuf::from("/var/tmp/scratch"));
        assert_eq!(config.controller.target_file, "effx.yaml");
        assert_eq!(config.registry.api_key, "secret");
        assert_eq!(config.github.organizations, vec!["acme", "initech"]);
        assert!(config.gitlab.groups.is_empty());
    }
}
