use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{IngestError, Result};

/// Branch assumed when the reference does not name one.
///
/// The repository's actual default branch is not queried, so a repository whose default
/// is not `main` fails later at listing or fetch time.
pub const DEFAULT_BRANCH: &str = "main";

/// Host prefix every repository reference must start with.
pub const HOST_PREFIX: &str = "https://github.com/";

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(
            r"^{}(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?(?:/tree/(?P<branch>[^?#]+?))?/?$",
            regex::escape(HOST_PREFIX)
        );
        Regex::new(&pattern).expect("repository reference pattern is valid")
    })
}

/// Owner, repository and branch of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryLocation {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepositoryLocation {
    /// Parse `https://github.com/<owner>/<repo>[/tree/<branch>]`.
    ///
    /// # Errors
    /// [`IngestError::InvalidReference`] for any other shape.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let Some(caps) = reference_pattern().captures(reference) else {
            error!(reference, "Repository reference does not match the accepted shape");
            return Err(IngestError::InvalidReference {
                reference: reference.to_string(),
            });
        };

        let location = Self {
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            branch: caps
                .name("branch")
                .map_or(DEFAULT_BRANCH, |m| m.as_str())
                .to_string(),
        };
        debug!(owner = %location.owner, repo = %location.repo, branch = %location.branch, "Parsed repository reference");
        Ok(location)
    }

    /// `owner/repo`, as used in API paths.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Raw-content address of `path` at this location's branch.
    ///
    /// Every path and branch segment is percent-encoded, so names containing `#`, `?` or
    /// `%` address the file they name.
    pub fn raw_url(&self, raw_base_url: &Url, path: &str) -> String {
        let mut url = raw_base_url.clone();
        let prefix = [self.owner.as_str(), self.repo.as_str(), "refs", "heads"];
        push_segments(
            &mut url,
            prefix
                .into_iter()
                .chain(self.branch.split('/'))
                .chain(path.split('/')),
        );
        url.into()
    }
}

/// Append each non-empty segment to `url`'s path, percent-encoded.
pub(crate) fn push_segments<'s>(url: &mut Url, segments: impl IntoIterator<Item = &'s str>) {
    // Bases come from IngestConfig::{api_base, raw_base}, which reject cannot-be-a-base URLs.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty()
            .extend(segments.into_iter().filter(|segment| !segment.is_empty()));
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}
