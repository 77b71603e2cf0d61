//! # repo-ingest CLI Interface
//!
//! Command parsing and orchestration for the `repo-ingest` binary. Everything beyond
//! argument handling, report shaping and user-facing error messages lives in
//! [`repo_ingest_core`].
//!
//! ## Commands
//! - `ingest`: collect and fetch a repository's files and pair them with a requirements
//!   document, printing (or writing) one JSON report.
//! - `requirements`: sniff and extract a requirements document only; no network access.
//!
//! Ctrl-C cancels an `ingest` run in flight; no partial report is written.
//!
//! For programmatic or integration use call [`run`] with a constructed [`Cli`].

use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repo_ingest_core::config::IngestConfig;
use repo_ingest_core::github::GitHubClient;
use repo_ingest_core::pipeline::{Ingestion, IngestionPipeline};
use repo_ingest_core::requirements::RequirementsDocument;
use repo_ingest_core::sniff::read_upload;
use repo_ingest_core::{ErrorKind, IngestError};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// CLI for repo-ingest: gather a GitHub repository's sources next to a requirements document.
#[derive(Parser)]
#[clap(
    name = "repo-ingest",
    version,
    about = "Fetch a GitHub repository's source files and a requirements document as one JSON report"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a repository and a requirements document into a JSON report
    Ingest {
        /// Repository URL, e.g. https://github.com/owner/repo/tree/branch
        #[clap(long)]
        repo: String,
        /// Requirements document (plain text or PDF)
        #[clap(long)]
        requirements: PathBuf,
        /// Optional YAML config file; defaults are used when omitted
        #[clap(long)]
        config: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the detected kind and the extracted text of a requirements document
    Requirements {
        /// Requirements document (plain text or PDF)
        #[clap(long)]
        file: PathBuf,
    },
}

/// One collected file and its contents.
#[derive(Debug, Serialize)]
pub struct ReportFile {
    pub path: String,
    pub url: String,
    pub content: String,
}

/// The JSON document printed by `ingest`.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub repository: String,
    pub branch: String,
    pub files: Vec<ReportFile>,
    pub requirements: RequirementsDocument,
}

impl From<Ingestion> for IngestReport {
    fn from(ingestion: Ingestion) -> Self {
        let Ingestion {
            location,
            files,
            corpus,
            requirements,
        } = ingestion;
        let files = files
            .into_iter()
            .zip(corpus.into_inner())
            .map(|(file, content)| ReportFile {
                path: file.path,
                url: file.resolved_url,
                content,
            })
            .collect();
        Self {
            repository: location.full_name(),
            branch: location.branch,
            files,
            requirements,
        }
    }
}

/// User-facing message for each failure kind.
pub fn describe(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidReference => {
            "the repository must be a GitHub URL like https://github.com/<owner>/<repo>[/tree/<branch>]"
        }
        ErrorKind::Read => "the requirements document could not be read",
        ErrorKind::UnsupportedDocumentType => {
            "the requirements document is neither plain text nor PDF"
        }
        ErrorKind::MalformedDocument => "the requirements document could not be parsed",
        ErrorKind::Listing => {
            "the repository tree could not be listed (check the repository, the branch and the GitHub rate limit)"
        }
        ErrorKind::Fetch => "a repository file could not be downloaded",
        ErrorKind::InvalidConfig => "the configured GitHub endpoints are not usable URLs",
        ErrorKind::Cancelled => "ingestion was cancelled",
        ErrorKind::Analysis => "the analysis service failed",
    }
}

fn user_error(e: IngestError) -> anyhow::Error {
    let message = describe(e.kind());
    tracing::error!(kind = ?e.kind(), error = %e, "Ingestion failed");
    anyhow::Error::new(e).context(message)
}

fn read_requirements(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)
        .map_err(IngestError::from)
        .map_err(user_error)
        .with_context(|| format!("opening {}", path.display()))?;
    read_upload(file).map_err(user_error)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Cancels the returned token on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling ingestion");
            on_signal.cancel();
        }
    });
    cancel
}

fn emit(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!(output = ?path, "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Ingest {
            repo,
            requirements,
            config,
            output,
        } => {
            let config = match config {
                Some(path) => load_config(path)?,
                None => IngestConfig::default(),
            };
            tracing::info!(command = "ingest", repo = %repo, "Starting ingestion");
            let bytes = read_requirements(&requirements)?;

            let client = GitHubClient::new(&config).map_err(user_error)?;
            let pipeline = IngestionPipeline::new(&client, &client, config);
            let cancel = cancel_on_interrupt();
            let ingestion = pipeline
                .run(&repo, &bytes, &file_name(&requirements), &cancel)
                .await
                .map_err(user_error)?;

            let report = IngestReport::from(ingestion);
            tracing::info!(
                command = "ingest",
                repository = %report.repository,
                files = report.files.len(),
                "Ingestion complete"
            );
            emit(&serde_json::to_string_pretty(&report)?, output.as_deref())
        }
        Commands::Requirements { file } => {
            tracing::info!(command = "requirements", file = ?file, "Extracting requirements");
            let bytes = read_requirements(&file)?;
            let document =
                RequirementsDocument::from_upload(&bytes, &file_name(&file)).map_err(user_error)?;
            emit(&serde_json::to_string_pretty(&document)?, None)
        }
    }
}
