//! Loads the static YAML settings (no secrets) and merges in credentials from the
//! environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use jenkins_summary_core::summarise::CONFIG_FILE_NAME;
use serde::Deserialize;
use tracing::{error, info};

use crate::retry::RetryPolicy;

pub const USERNAME_VAR: &str = "JENKINS_USERNAME";
pub const PASSWORD_VAR: &str = "JENKINS_PASSWORD";

/// Fully merged settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceSettings,
    pub retry: RetryPolicy,
}

/// Where job configurations come from.
#[derive(Debug, Clone)]
pub enum SourceSettings {
    Server {
        base_url: String,
        credentials: Credentials,
    },
    Filesystem {
        root: PathBuf,
        config_file_name: String,
    },
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct StaticConfig {
    source: SourceYaml,
    #[serde(default)]
    retry: Option<RetryYaml>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SourceYaml {
    Server {
        base_url: String,
    },
    Filesystem {
        root: PathBuf,
        #[serde(default)]
        config_file_name: Option<String>,
    },
}

#[derive(Deserialize)]
struct RetryYaml {
    #[serde(default = "default_attempts")]
    attempts: u32,
    #[serde(default = "default_backoff_ms")]
    backoff_ms: u64,
}

fn default_attempts() -> u32 {
    RetryPolicy::default().attempts
}

fn default_backoff_ms() -> u64 {
    RetryPolicy::default().backoff.as_millis() as u64
}

/// Reads the YAML file at `path` and, for a server source, the credentials in
/// `JENKINS_USERNAME` / `JENKINS_PASSWORD` (a `.env` file is honoured).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {:?}", path_ref))?;
    let static_conf: StaticConfig = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;

    let retry = match static_conf.retry {
        Some(r) => {
            if r.attempts == 0 {
                anyhow::bail!("retry.attempts must be at least 1");
            }
            RetryPolicy::new(r.attempts, Duration::from_millis(r.backoff_ms))
        }
        None => RetryPolicy::default(),
    };

    let source = match static_conf.source {
        SourceYaml::Server { base_url } => {
            dotenvy::dotenv().ok();
            let credentials = Credentials {
                username: required_env(USERNAME_VAR)?,
                password: required_env(PASSWORD_VAR)?,
            };
            info!(base_url = %base_url, username = %credentials.username, "Configured server source");
            SourceSettings::Server {
                base_url,
                credentials,
            }
        }
        SourceYaml::Filesystem {
            root,
            config_file_name,
        } => {
            let config_file_name = config_file_name.unwrap_or_else(|| CONFIG_FILE_NAME.to_string());
            info!(root = %root.display(), config_file_name = %config_file_name, "Configured filesystem source");
            SourceSettings::Filesystem {
                root,
                config_file_name,
            }
        }
    };

    info!(
        attempts = retry.attempts,
        backoff_ms = retry.backoff.as_millis() as u64,
        "Config loaded and merged successfully"
    );
    Ok(Settings { source, retry })
}

fn required_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => {
            error!(var = key, "Environment variable is empty");
            anyhow::bail!("{key} environment variable is empty")
        }
        Err(e) => {
            error!(error = ?e, var = key, "Environment variable not set");
            anyhow::bail!("{key} environment variable not set: {e}")
        }
    }
}
