use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub revendor: RevendorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Default)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    /// Base URL of a GitHub Enterprise API. Defaults to api.github.com.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

// Manual Debug impl to avoid leaking the token and webhook secret
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RevendorConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Parent directory for checkouts. Defaults to the system temp dir.
    #[serde(default)]
    pub workspace_dir: Option<PathBuf>,
    #[serde(default = "default_git_program")]
    pub git_program: String,
    #[serde(default = "default_go_program")]
    pub go_program: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RevendorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            workspace_dir: None,
            git_program: default_git_program(),
            go_program: default_go_program(),
        }
    }
}

impl RevendorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.workspace_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_go_program() -> String {
    "go".to_string()
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("revendorbot").required(false));
        }

        // Environment overrides, e.g. REVENDORBOT__GITHUB__TOKEN for github.token
        builder = builder.add_source(
            config::Environment::with_prefix("REVENDORBOT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let mut app: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if app.github.token.is_empty() {
            app.github.token = std::env::var(TOKEN_ENV).unwrap_or_default();
        }
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> Result<()> {
        if self.github.token.trim().is_empty() {
            return Err(AppError::Config(format!(
                "GitHub API token missing - must set {TOKEN_ENV} or github.token"
            )));
        }
        if self.revendor.timeout_secs == 0 {
            return Err(AppError::Config(
                "revendor.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The webhook secret, required only by the listener.
    pub fn webhook_secret(&self) -> Result<&str> {
        self.github
            .webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("github.webhook_secret is required to serve".into()))
    }
}
