use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{IngestError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";

/// Tunables for one ingestion run: remote endpoints, request deadline and traversal limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Base URL of the REST API serving `/repos/{owner}/{repo}/contents/{path}`.
    pub api_base_url: String,
    /// Base URL of the raw-content host; files resolve to `{raw}/{owner}/{repo}/refs/heads/{branch}/{path}`.
    pub raw_base_url: String,
    pub user_agent: String,
    /// Deadline applied to every single outbound call.
    pub request_timeout_secs: u64,
    /// Maximum number of raw-content fetches in flight at once.
    pub fetch_concurrency: usize,
    /// Deepest directory level the collector will descend into (root is 0).
    pub max_depth: usize,
    /// Upper bound on listed entries across the whole tree.
    pub max_entries: usize,
    /// Directory the walk starts from; empty means the repository root.
    pub root_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            user_agent: concat!("repo-ingest/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            fetch_concurrency: 6,
            max_depth: 32,
            max_entries: 10_000,
            root_path: String::new(),
        }
    }
}

impl IngestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// [`Self::api_base_url`] parsed; path segments can be appended to it.
    ///
    /// # Errors
    /// [`IngestError::InvalidConfig`] if it is not an absolute hierarchical URL.
    pub fn api_base(&self) -> Result<Url> {
        parse_base("api_base_url", &self.api_base_url)
    }

    /// [`Self::raw_base_url`] parsed; path segments can be appended to it.
    ///
    /// # Errors
    /// [`IngestError::InvalidConfig`] if it is not an absolute hierarchical URL.
    pub fn raw_base(&self) -> Result<Url> {
        parse_base("raw_base_url", &self.raw_base_url)
    }

    pub fn trace_loaded(&self) {
        info!(
            api_base_url = %self.api_base_url,
            raw_base_url = %self.raw_base_url,
            request_timeout_secs = self.request_timeout_secs,
            fetch_concurrency = self.fetch_concurrency,
            "Loaded IngestConfig"
        );
        debug!(?self, "IngestConfig loaded (full debug)");
    }
}

fn parse_base(field: &'static str, value: &str) -> Result<Url> {
    let invalid = |reason: String| {
        error!(field, value, %reason, "Unusable base URL in configuration");
        IngestError::InvalidConfig { field, reason }
    };
    let url = Url::parse(value).map_err(|e| invalid(format!("{value:?} is not a URL: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(invalid(format!("{value:?} cannot carry a path")));
    }
    Ok(url)
}
