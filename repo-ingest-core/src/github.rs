//! # GitHub client
//!
//! `reqwest` implementation of [`ContentsApi`] and [`RawContentApi`] for anonymous access
//! to the GitHub REST contents endpoint and the raw-content host.
//!
//! - Listing: `GET {api}/repos/{owner}/{repo}/contents/{path}?ref={branch}`, following
//!   `Link: <...>; rel="next"` until exhausted. Entries that are neither files nor
//!   directories (symlinks, submodules) are dropped.
//! - Raw content: `GET {resolved_url}`, the body read fully as text.
//!
//! Non-success statuses are errors. An exhausted anonymous rate limit is reported as such
//! so it can be told apart from a missing repository or branch.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::contract::{ContentsApi, RawContentApi, RemoteError, TreeEntry};
use crate::error::{IngestError, Result};
use crate::location::{push_segments, RepositoryLocation};

const GITHUB_JSON: &str = "application/vnd.github+json";

/// One item of a contents listing, as returned by the API.
#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

pub struct GitHubClient {
    http: Client,
    api_base_url: Url,
}

impl GitHubClient {
    /// Build a client whose every request is bounded by the configured timeout.
    ///
    /// # Errors
    /// [`IngestError::InvalidConfig`] if the API base URL is unusable or the underlying
    /// HTTP client cannot be constructed (e.g. TLS backend init).
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let api_base_url = config.api_base()?;
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build HTTP client");
                IngestError::InvalidConfig {
                    field: "user_agent",
                    reason: format!("HTTP client cannot be built: {e}"),
                }
            })?;
        info!(api_base_url = %api_base_url, "Initialised GitHub client");
        Ok(Self { http, api_base_url })
    }

    /// `{api}/repos/{owner}/{repo}/contents/{path}?ref={branch}`, every part percent-encoded.
    fn contents_url(&self, location: &RepositoryLocation, path: &str) -> Url {
        let mut url = self.api_base_url.clone();
        let prefix = ["repos", location.owner.as_str(), location.repo.as_str(), "contents"];
        push_segments(&mut url, prefix.into_iter().chain(path.split('/')));
        url.query_pairs_mut().append_pair("ref", &location.branch);
        url
    }
}

#[async_trait]
impl ContentsApi for GitHubClient {
    async fn list_directory(
        &self,
        location: &RepositoryLocation,
        path: &str,
    ) -> std::result::Result<Vec<TreeEntry>, RemoteError> {
        let mut entries = Vec::new();
        let mut next = Some(self.contents_url(location, path).to_string());

        while let Some(url) = next.take() {
            debug!(url = %url, "Listing repository directory");
            let resp = self.http.get(&url).header(ACCEPT, GITHUB_JSON).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(status_error(&url, status, resp.headers()));
            }
            next = next_page(resp.headers());

            let items: Vec<ContentItem> = resp.json().await.map_err(|e| {
                error!(error = ?e, url = %url, "Undecodable directory listing");
                format!("undecodable listing response from {url}: {e}")
            })?;
            for item in items {
                match item.kind.as_str() {
                    "file" => entries.push(TreeEntry::file(item.path)),
                    "dir" => entries.push(TreeEntry::dir(item.path)),
                    other => debug!(name = %item.name, kind = other, "Skipping non-file entry"),
                }
            }
        }

        debug!(path, entries = entries.len(), "Directory listed");
        Ok(entries)
    }
}

#[async_trait]
impl RawContentApi for GitHubClient {
    async fn fetch_raw(&self, url: &str) -> std::result::Result<String, RemoteError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(url, status, resp.headers()));
        }
        let text = resp.text().await?;
        debug!(url, bytes = text.len(), "Fetched raw content");
        Ok(text)
    }
}

fn status_error(url: &str, status: StatusCode, headers: &HeaderMap) -> RemoteError {
    let rate_limited = matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        && headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0");
    if rate_limited {
        warn!(url, %status, "GitHub rate limit exhausted");
        return format!("rate limit exceeded ({status}) requesting {url}").into();
    }
    error!(url, %status, "Remote call returned error status");
    format!("GET {url} returned {status}").into()
}

/// Extract the `rel="next"` target from an RFC 5988 `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}
