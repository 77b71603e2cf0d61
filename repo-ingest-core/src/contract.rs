//! # contract: interfaces to the remote collaborators of the pipeline
//!
//! The pipeline talks to three things it does not own: the remote listing API, the
//! raw-content host and the analysis collaborator. Each is a trait here so the
//! production client ([`crate::github::GitHubClient`]) and test doubles are
//! interchangeable.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall`; `MockContentsApi`, `MockRawContentApi` and
//!   `MockAnalyst` are exported under the `test-export-mocks` feature for integration tests.
//!
//! ## Errors
//! - Implementors return a boxed [`RemoteError`]. The collector and fetcher wrap it in
//!   the matching [`crate::IngestError`] variant together with the path or URL involved.

use async_trait::async_trait;
use serde::Serialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::location::RepositoryLocation;

/// Error type returned across the remote seams.
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// What a listing entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Repository-relative path, e.g. `src/main.go`.
    pub path: String,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// A file that passed the allow-list, with its resolved raw-content address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawFileRef {
    pub path: String,
    #[serde(rename = "url")]
    pub resolved_url: String,
}

/// File contents in discovery order; position `i` belongs to the `i`-th [`RawFileRef`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Corpus(Vec<String>);

impl Corpus {
    pub fn new(files: Vec<String>) -> Self {
        Self(files)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    /// Total size of all file contents in bytes.
    pub fn total_bytes(&self) -> usize {
        self.0.iter().map(String::len).sum()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Directory listing against the remote contents API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// List the immediate entries of `path` (empty for the root) at the location's branch.
    ///
    /// Implementations follow pagination until exhausted and return entries in the
    /// order the remote API reports them.
    async fn list_directory(
        &self,
        location: &RepositoryLocation,
        path: &str,
    ) -> Result<Vec<TreeEntry>, RemoteError>;
}

/// Raw file retrieval from a resolved content address.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RawContentApi: Send + Sync {
    /// Fetch the full body at `url` as text.
    async fn fetch_raw(&self, url: &str) -> Result<String, RemoteError>;
}

/// The downstream consumer of an ingestion: builds a prompt, calls a model, etc.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Analyse the corpus against the requirements text and return the analysis.
    async fn analyse(&self, corpus: &Corpus, requirements: &str) -> Result<String, RemoteError>;
}
