//! Layered runtime configuration.
//!
//! Settings come from three places, later ones winning:
//! built-in defaults, an optional YAML file, then command-line flags
//! (which clap may in turn fill from environment variables).
//!
//! ```yaml
//! user_agent: "my-bot/1.0"
//! timeout_secs: 10
//! max_attempts: 5
//! backoff_ms: 250
//! concurrency: 8
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::fetch::FetchOptions;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Contents of the YAML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<usize>,
    pub backoff_ms: Option<u64>,
    pub concurrency: Option<usize>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub fetch: FetchOptions,
    pub concurrency: usize,
}

/// Parse a YAML config document.
pub fn parse_config(text: &str, path: &str) -> Result<FileConfig, ConfigError> {
    serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
        path: path.to_string(),
        source,
    })
}

/// Read and parse the YAML config at `path`.
#[instrument(level = "info")]
pub async fn load_config(path: &str) -> Result<FileConfig, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let config = parse_config(&text, path)?;
    debug!(?config, "Loaded config file");
    Ok(config)
}

/// Merge defaults, the config file and CLI overrides.
pub fn resolve(cli: &Cli, file: &FileConfig) -> Settings {
    let defaults = FetchOptions::default();

    let timeout = cli
        .timeout_secs
        .or(file.timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(defaults.timeout);
    let max_attempts = cli
        .max_attempts
        .or(file.max_attempts)
        .unwrap_or(defaults.max_attempts)
        .max(1);
    let backoff_step = file
        .backoff_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.backoff_step);

    Settings {
        fetch: FetchOptions {
            user_agent: file.user_agent.clone().unwrap_or(defaults.user_agent),
            accept_language: file
                .accept_language
                .clone()
                .unwrap_or(defaults.accept_language),
            timeout,
            max_attempts,
            backoff_step,
        },
        concurrency: cli
            .concurrency
            .or(file.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
            .max(1),
    }
}
