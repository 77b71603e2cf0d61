//! High-level pipeline: requirements upload + repository reference → ingestion → analysis.
//!
//! This module orchestrates one validation request:
//!   - Sniffs the uploaded requirements artifact and extracts its text (plain text or PDF)
//!   - Parses the repository reference into owner, repository and branch
//!   - Collects the allowed files of the repository tree
//!   - Fetches their contents into an ordered corpus
//!   - Optionally hands `(corpus, requirements text)` to an [`Analyst`]
//!
//! # Error Handling
//! Every stage fails fast. The first error is returned unchanged and later stages do not
//! run; there are no retries and no fallback stages.
//!
//! # Navigation
//! - Main entrypoints: [`IngestionPipeline::run`], [`IngestionPipeline::validate`]
//! - Supporting types: [`Ingestion`], [`Validation`]

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::collector::{CollectLimits, TreeCollector};
use crate::config::IngestConfig;
use crate::contract::{Analyst, ContentsApi, Corpus, RawContentApi, RawFileRef};
use crate::error::{IngestError, Result};
use crate::fetcher::ContentFetcher;
use crate::location::RepositoryLocation;
use crate::requirements::RequirementsDocument;

/// Everything gathered for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingestion {
    pub location: RepositoryLocation,
    /// Collected files; `files[i]` is the source of `corpus[i]`.
    pub files: Vec<RawFileRef>,
    pub corpus: Corpus,
    pub requirements: RequirementsDocument,
}

/// An ingestion together with the analyst's verdict on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub ingestion: Ingestion,
    pub analysis: String,
}

pub struct IngestionPipeline<'a, C: ?Sized, R: ?Sized> {
    contents: &'a C,
    raw: &'a R,
    config: IngestConfig,
}

impl<'a, C, R> IngestionPipeline<'a, C, R>
where
    C: ContentsApi + ?Sized,
    R: RawContentApi + ?Sized,
{
    pub fn new(contents: &'a C, raw: &'a R, config: IngestConfig) -> Self {
        Self {
            contents,
            raw,
            config,
        }
    }

    /// Ingest the requirements upload and the referenced repository.
    ///
    /// # Errors
    /// The first failing stage's error, unchanged: document errors from sniffing and
    /// extraction, [`IngestError::InvalidReference`], [`IngestError::InvalidConfig`],
    /// [`IngestError::Listing`], [`IngestError::Fetch`] or [`IngestError::Cancelled`].
    pub async fn run(
        &self,
        reference: &str,
        requirements_bytes: &[u8],
        requirements_filename: &str,
        cancel: &CancellationToken,
    ) -> Result<Ingestion> {
        let span = info_span!("ingest", reference, requirements = requirements_filename);
        self.ingest(reference, requirements_bytes, requirements_filename, cancel)
            .instrument(span)
            .await
    }

    /// Run the ingestion and hand `(corpus, requirements text)` to `analyst` verbatim.
    ///
    /// # Errors
    /// Any [`IngestionPipeline::run`] error, or [`IngestError::Analysis`] if the analyst fails.
    pub async fn validate<A>(
        &self,
        reference: &str,
        requirements_bytes: &[u8],
        requirements_filename: &str,
        analyst: &A,
        cancel: &CancellationToken,
    ) -> Result<Validation>
    where
        A: Analyst + ?Sized,
    {
        let ingestion = self
            .run(reference, requirements_bytes, requirements_filename, cancel)
            .await?;
        let analysis = analyst
            .analyse(&ingestion.corpus, &ingestion.requirements.text)
            .await
            .map_err(|e| {
                error!(error = %e, "[INGEST][ERROR] Analysis collaborator failed");
                IngestError::Analysis(e)
            })?;
        info!(chars = analysis.len(), "[INGEST] Analysis received");
        Ok(Validation {
            ingestion,
            analysis,
        })
    }

    async fn ingest(
        &self,
        reference: &str,
        requirements_bytes: &[u8],
        requirements_filename: &str,
        cancel: &CancellationToken,
    ) -> Result<Ingestion> {
        info!("[INGEST] Starting ingestion pipeline");

        // --- Step 1: Requirements ---
        let requirements =
            RequirementsDocument::from_upload(requirements_bytes, requirements_filename)?;
        info!(kind = ?requirements.kind, "[INGEST] Requirements extracted");

        // --- Step 2: Repository location ---
        let location = RepositoryLocation::parse(reference)?;

        // --- Step 3: Tree ---
        let collector = TreeCollector::new(
            self.contents,
            self.config.raw_base()?,
            CollectLimits::from(&self.config),
        );
        let files = collector
            .collect(&location, &self.config.root_path, cancel)
            .await?;
        info!(files = files.len(), "[INGEST] Tree collected");

        // --- Step 4: Contents ---
        let fetcher = ContentFetcher::from_config(self.raw, &self.config);
        let corpus = fetcher.fetch(&files, cancel).await?;

        info!(
            repository = %location,
            files = corpus.len(),
            bytes = corpus.total_bytes(),
            "[INGEST] Ingestion complete"
        );
        Ok(Ingestion {
            location,
            files,
            corpus,
            requirements,
        })
    }
}
