// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span};
use vcs_connect::config::{GitHubConfig, GitLabConfig};
use vcs_connect::utils::logging::{LogFormat, init_logger};
use vcs_connect::utils::signals::cancel_on_shutdown;
use vcs_connect::{
    Config, Controller, Credentials, DiscoverySource, FileScanner, GitCloner, GitHubApi, GitLabApi,
    HttpRegistry, ManifestInferrer, MetadataInferrer, NoopInferrer, ProviderSource,
    RepositoryProcessor, RunState, TargetMatcher, Telemetry, VersionInfo,
};

#[derive(Parser)]
#[command(name = "vcs-connect")]
#[command(author = "effx")]
#[command(version)]
#[command(about = "Index effx.yaml files across your version control provider", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", env = "VCS_CONNECT_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every repository in the configured GitHub organizations
    Github {
        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        provider: GitHubArgs,
    },

    /// Index every project in the configured GitLab groups
    Gitlab {
        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        provider: GitLabArgs,
    },

    /// Print version information
    Version,
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, value_name = "DIR", env = "SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    #[arg(long, value_name = "NUM", env = "WORKERS")]
    workers: Option<usize>,

    #[arg(long, action = ArgAction::SetTrue, env = "DISABLE_LANGUAGE_DETECTION")]
    disable_language_detection: bool,

    #[arg(long, value_name = "NAME", env = "TARGET_FILE")]
    target_file: Option<String>,

    #[arg(long, env = "EFFX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, value_name = "HOST", env = "EFFX_API_HOST")]
    api_host: Option<String>,
}

#[derive(Args)]
struct GitHubArgs {
    #[arg(long = "github-base-url", env = "GITHUB_BASE_URL")]
    base_url: Option<String>,

    #[arg(long = "github-upload-url", env = "GITHUB_UPLOAD_URL")]
    upload_url: Option<String>,

    #[arg(long = "github-username", env = "GITHUB_USERNAME")]
    username: Option<String>,

    #[arg(long = "github-access-token", env = "GITHUB_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Restrict discovery to these organizations
    #[arg(long = "github-organizations", env = "GITHUB_ORGANIZATIONS", value_delimiter = ',')]
    organizations: Vec<String>,
}

#[derive(Args)]
struct GitLabArgs {
    #[arg(long = "gitlab-base-url", env = "GITLAB_BASE_URL")]
    base_url: Option<String>,

    #[arg(long = "gitlab-username", env = "GITLAB_USERNAME")]
    username: Option<String>,

    #[arg(long = "gitlab-access-token", env = "GITLAB_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Restrict discovery to these groups
    #[arg(long = "gitlab-groups", env = "GITLAB_GROUPS", value_delimiter = ',')]
    groups: Vec<String>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(scratch_dir) = self.scratch_dir {
            config.controller.scratch_dir = scratch_dir;
        }
        if let Some(workers) = self.workers {
            config.controller.workers = workers;
        }
        if self.disable_language_detection {
            config.controller.disable_language_detection = true;
        }
        if let Some(target_file) = self.target_file {
            config.controller.target_file = target_file;
        }
        if let Some(api_key) = self.api_key {
            config.registry.api_key = api_key;
        }
        if let Some(api_host) = self.api_host {
            config.registry.api_url = api_host;
        }
    }
}

impl GitHubArgs {
    fn apply(self, config: &mut GitHubConfig) {
        if self.base_url.is_some() {
            config.base_url = self.base_url;
        }
        if self.upload_url.is_some() {
            config.upload_url = self.upload_url;
        }
        if let Some(username) = self.username {
            config.username = username;
        }
        if let Some(access_token) = self.access_token {
            config.access_token = access_token;
        }
        if !self.organizations.is_empty() {
            config.organizations = self.organizations;
        }
    }
}

impl GitLabArgs {
    fn apply(self, config: &mut GitLabConfig) {
        if self.base_url.is_some() {
            config.base_url = self.base_url;
        }
        if let Some(username) = self.username {
            config.username = username;
        }
        if let Some(access_token) = self.access_token {
            config.access_token = access_token;
        }
        if !self.groups.is_empty() {
            config.groups = self.groups;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logger(cli.log_format, cli.verbose);

    if let Err(e) = dispatch(cli).await {
        error!(error = %format!("{e:#}"), "vcs-connect failed");
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let load = |path: Option<PathBuf>| -> Result<Config> {
        if let Some(path) = &path {
            info!(path = %path.display(), "loading configuration");
        }
        Config::load(path.as_deref()).context("Failed to load configuration")
    };

    match cli.command {
        Commands::Version => {
            println!("{}", VersionInfo::current());
            Ok(())
        }
        Commands::Github { run, provider } => {
            let mut config = load(cli.config)?;
            run.apply(&mut config);
            provider.apply(&mut config.github);

            let credentials = Credentials::new(&config.github.username, &config.github.access_token);
            let api = GitHubApi::new(&config.github).context("Failed to configure GitHub")?;
            let source = ProviderSource::new(api, config.github.organizations.clone());

            cmd_run(&config, Arc::new(source), credentials).await
        }
        Commands::Gitlab { run, provider } => {
            let mut config = load(cli.config)?;
            run.apply(&mut config);
            provider.apply(&mut config.gitlab);

            let credentials = Credentials::new(&config.gitlab.username, &config.gitlab.access_token);
            let api = GitLabApi::new(&config.gitlab).context("Failed to configure GitLab")?;
            let source = ProviderSource::new(api, config.gitlab.groups.clone());

            cmd_run(&config, Arc::new(source), credentials).await
        }
    }
}

async fn cmd_run(
    config: &Config,
    source: Arc<dyn DiscoverySource>,
    credentials: Credentials,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let started_at = chrono::Utc::now();
    info!(
        source = source.name(),
        workers = config.controller.workers,
        scratch_dir = %config.controller.scratch_dir.display(),
        started_at = %started_at.to_rfc3339(),
        "starting vcs-connect"
    );

    let registry = HttpRegistry::new(&config.registry).context("Failed to create registry client")?;
    let matcher =
        TargetMatcher::new(&config.controller.target_file).context("Invalid target file name")?;

    let inferrer: Arc<dyn MetadataInferrer> = if config.controller.disable_language_detection {
        Arc::new(NoopInferrer)
    } else {
        Arc::new(ManifestInferrer::new())
    };

    let processor = RepositoryProcessor::new(
        config.controller.scratch_dir.clone(),
        FileScanner::new(matcher),
        Arc::new(GitCloner::new(Some(credentials))),
        inferrer,
        Arc::new(registry),
    );

    let telemetry = Telemetry::new(info_span!("run", source = source.name()));
    let controller = Controller::new(&config.controller, source, Arc::new(processor), telemetry)
        .context("Failed to create controller")?;

    let cancel = CancellationToken::new();
    let shutdown = cancel_on_shutdown(cancel.clone());

    let outcome = controller.run(&cancel).await.context("Run failed")?;
    shutdown.abort();

    let elapsed = chrono::Utc::now() - started_at;
    info!(
        state = ?outcome.state,
        elapsed_secs = elapsed.num_seconds(),
        success_rate = %format!("{:.1}%", outcome.summary.success_rate()),
        "vcs-connect finished"
    );

    if outcome.state == RunState::Cancelled {
        info!("run was cancelled before discovery finished");
    }

    Ok(())
}
