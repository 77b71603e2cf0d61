//! `load_config` module: reads the optional YAML config file and maps it onto the core
//! [`IngestConfig`].
//!
//! The file has two optional sections; any key left out keeps its default:
//!
//! ```yaml
//! github:
//!   api_base_url: https://api.github.com
//!   raw_base_url: https://raw.githubusercontent.com
//!   user_agent: my-tool/1.0
//! limits:
//!   request_timeout_secs: 30
//!   fetch_concurrency: 6
//!   max_depth: 32
//!   max_entries: 10000
//!   root_path: ""
//! ```
//!
//! # Errors
//! Unreadable files and invalid YAML surface as `anyhow::Error` at the CLI boundary.

use anyhow::Result;
use repo_ingest_core::config::IngestConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub github: GitHubSection,
    #[serde(default)]
    pub limits: LimitsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubSection {
    pub api_base_url: Option<String>,
    pub raw_base_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    pub request_timeout_secs: Option<u64>,
    pub fetch_concurrency: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_entries: Option<usize>,
    pub root_path: Option<String>,
}

impl From<CliConfig> for IngestConfig {
    fn from(raw: CliConfig) -> Self {
        let defaults = IngestConfig::default();
        let CliConfig { github, limits } = raw;
        IngestConfig {
            api_base_url: github.api_base_url.unwrap_or(defaults.api_base_url),
            raw_base_url: github.raw_base_url.unwrap_or(defaults.raw_base_url),
            user_agent: github.user_agent.unwrap_or(defaults.user_agent),
            request_timeout_secs: limits
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            fetch_concurrency: limits.fetch_concurrency.unwrap_or(defaults.fetch_concurrency),
            max_depth: limits.max_depth.unwrap_or(defaults.max_depth),
            max_entries: limits.max_entries.unwrap_or(defaults.max_entries),
            root_path: limits.root_path.unwrap_or(defaults.root_path),
        }
    }
}

/// Loads the YAML config file at `path` into an [`IngestConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<IngestConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid, all-defaults config.
    let raw: CliConfig = if config_content.trim().is_empty() {
        CliConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let config = IngestConfig::from(raw);
    if config.fetch_concurrency == 0 {
        error!(config_path = ?path_ref, "fetch_concurrency must be at least 1");
        return Err(anyhow::anyhow!("limits.fetch_concurrency must be at least 1"));
    }
    for checked in [config.api_base(), config.raw_base()] {
        if let Err(e) = checked {
            error!(error = %e, config_path = ?path_ref, "Unusable base URL in config");
            return Err(anyhow::anyhow!("Invalid config: {e}"));
        }
    }
    config.trace_loaded();
    Ok(config)
}
