#![doc = "repo-ingest-core: core logic library for repo-ingest."]

//! This crate contains the ingestion pipeline behind repo-ingest: it walks a hosted
//! repository through the remote contents API, keeps the source and text files worth
//! analysing, fetches their contents and pairs them with the text of an uploaded
//! requirements document (plain text or PDF).
//!
//! Prompt construction, LLM calls and persistence live outside this crate; the
//! pipeline hands its result to an [`contract::Analyst`] implementation.
//!
//! # Usage
//! Build a [`github::GitHubClient`] from an [`config::IngestConfig`] and pass it to
//! [`pipeline::IngestionPipeline`].

pub mod collector;
pub mod config;
pub mod contract;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod filter;
pub mod github;
pub mod location;
pub mod pipeline;
pub mod requirements;
pub mod sniff;

pub use error::{ErrorKind, IngestError, Result};
