//! Error taxonomy shared by every stage of the ingestion pipeline.
//!
//! Each stage fails fast and returns the first error unchanged; nothing in this crate
//! retries or returns a partial result next to an error. Callers that present errors to
//! users should branch on [`IngestError::kind`] rather than on message text.

use thiserror::Error;

use crate::contract::RemoteError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while ingesting a repository and a requirements document.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The repository reference is not of the form `https://github.com/<owner>/<repo>[/tree/<branch>]`.
    #[error("invalid repository reference {reference:?}")]
    InvalidReference { reference: String },

    /// The uploaded requirements stream could not be read.
    #[error("failed to read requirements upload: {0}")]
    Read(#[from] std::io::Error),

    /// Neither the content nor the filename identified the upload as text or PDF.
    #[error("unsupported requirements document type for {filename:?}")]
    UnsupportedDocumentType { filename: String },

    /// The PDF could not be parsed, a page's text could not be extracted, or no text remained.
    #[error("malformed requirements document: {reason}")]
    MalformedDocument { reason: String },

    /// A directory listing call failed or returned something that could not be decoded.
    #[error("failed to list {path:?}: {source}")]
    Listing {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// A raw-content call failed.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: RemoteError,
    },

    /// A configured base URL cannot be used to address repository content.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The governing cancellation token fired before the pipeline finished.
    #[error("ingestion cancelled")]
    Cancelled,

    /// The analysis collaborator rejected or failed to process the ingestion.
    #[error("analysis failed: {0}")]
    Analysis(#[source] RemoteError),
}

/// Fieldless view of [`IngestError`] for mapping errors to client-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidReference,
    Read,
    UnsupportedDocumentType,
    MalformedDocument,
    Listing,
    Fetch,
    InvalidConfig,
    Cancelled,
    Analysis,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidReference { .. } => ErrorKind::InvalidReference,
            Self::Read(_) => ErrorKind::Read,
            Self::UnsupportedDocumentType { .. } => ErrorKind::UnsupportedDocumentType,
            Self::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            Self::Listing { .. } => ErrorKind::Listing,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Analysis(_) => ErrorKind::Analysis,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    pub(crate) fn listing(path: &str, source: impl Into<RemoteError>) -> Self {
        Self::Listing {
            path: path.to_string(),
            source: source.into(),
        }
    }
}
