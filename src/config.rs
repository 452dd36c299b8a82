//! Configuration loader and validator for the recipe catalog client.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub remote: Remote,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// Remote catalog settings.
///
/// `endpoint` is deliberately not validated here: a missing or malformed
/// endpoint is reported by the client as `FetchError::InvalidEndpoint`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Remote {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub allow_redirect_status: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl App {
    /// Data dir with a leading `~/` expanded against `$HOME`.
    pub fn resolved_data_dir(&self) -> String {
        expand_home(&self.data_dir)
    }
}

/// Expand a leading `~/` using `HOME`; anything else is returned unchanged.
pub fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path.to_string(),
    }
}

impl Remote {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.app.resolved_data_dir())
    }

    /// SQLite URL for the local store. `DATABASE_URL` wins when set.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}/recipes.db", self.app.resolved_data_dir()))
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.remote.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("remote.timeout_seconds must be > 0"));
    }
    if let Some(agent) = &cfg.remote.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Invalid("remote.user_agent must be non-empty when set"));
        }
    }
    Ok(())
}

/// Example configuration, written by `recipe-fetch init-config`.
pub fn example() -> &'static str {
    r#"app:
  # Directory holding recipes.db
  data_dir: "./data"

remote:
  # Full recipe catalog, returned in one response
  endpoint: "https://d3jbb8n5wk0qxi.cloudfront.net/recipes.json"
  timeout_seconds: 30
  # Pass 3xx responses through to the decoder instead of failing
  allow_redirect_status: false
"#
}
