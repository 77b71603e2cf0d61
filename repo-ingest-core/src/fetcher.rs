//! Raw-content retrieval for collected files.
//!
//! Fetches run on a bounded pool (`fetch_concurrency` in flight) and land in the slot of
//! their input index, so the corpus order always matches the ref order. The first failure
//! cancels every in-flight and queued fetch and is the error returned; no partial corpus
//! ever leaves this module.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::IngestConfig;
use crate::contract::{Corpus, RawContentApi, RawFileRef};
use crate::error::{IngestError, Result};

pub struct ContentFetcher<'a, R: RawContentApi + ?Sized> {
    api: &'a R,
    concurrency: usize,
    request_timeout: Duration,
}

impl<'a, R: RawContentApi + ?Sized> ContentFetcher<'a, R> {
    pub fn new(api: &'a R, concurrency: usize, request_timeout: Duration) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
            request_timeout,
        }
    }

    pub fn from_config(api: &'a R, config: &IngestConfig) -> Self {
        Self::new(api, config.fetch_concurrency, config.request_timeout())
    }

    /// Fetch every ref's contents; position `i` of the corpus belongs to `refs[i]`.
    ///
    /// # Errors
    /// - [`IngestError::Fetch`] for the first fetch observed to fail or time out.
    /// - [`IngestError::Cancelled`] if `cancel` fires before all fetches complete.
    pub async fn fetch(&self, refs: &[RawFileRef], cancel: &CancellationToken) -> Result<Corpus> {
        info!(files = refs.len(), concurrency = self.concurrency, "Fetching file contents");
        let abort = cancel.child_token();
        let mut slots: Vec<Option<String>> = vec![None; refs.len()];

        let mut in_flight = stream::iter(refs.iter().enumerate())
            .map(|(index, file)| {
                let abort = abort.clone();
                async move { (index, self.fetch_one(file, &abort).await) }
            })
            .buffer_unordered(self.concurrency);

        while let Some((index, outcome)) = in_flight.next().await {
            match outcome {
                Ok(text) => slots[index] = Some(text),
                Err(e) => {
                    abort.cancel();
                    error!(path = %refs[index].path, error = %e, "Aborting fetch of remaining files");
                    return Err(e);
                }
            }
        }

        let corpus = Corpus::new(slots.into_iter().flatten().collect());
        info!(files = corpus.len(), bytes = corpus.total_bytes(), "File contents fetched");
        Ok(corpus)
    }

    async fn fetch_one(&self, file: &RawFileRef, cancel: &CancellationToken) -> Result<String> {
        let call = async {
            tokio::time::timeout(self.request_timeout, self.api.fetch_raw(&file.resolved_url))
                .await
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(IngestError::Cancelled),
            outcome = call => match outcome {
                Ok(Ok(text)) => {
                    debug!(path = %file.path, bytes = text.len(), "Fetched file");
                    Ok(text)
                }
                Ok(Err(source)) => Err(IngestError::Fetch {
                    url: file.resolved_url.clone(),
                    source,
                }),
                Err(_) => Err(IngestError::Fetch {
                    url: file.resolved_url.clone(),
                    source: format!("timed out after {:?}", self.request_timeout).into(),
                }),
            },
        }
    }
}
