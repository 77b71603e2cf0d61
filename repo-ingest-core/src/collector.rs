//! Repository tree traversal.
//!
//! Walks the remote directory structure pre-order, directory-first, one listing call at a
//! time, and keeps the files that pass [`crate::filter::is_allowed_path`]. The walk uses an
//! explicit stack of pending listings rather than recursion, so depth is bounded by
//! configuration instead of the call stack, and a visited set stops repeated or cyclic
//! directories from being listed twice.
//!
//! Any failed listing aborts the whole collection: callers never see a truncated tree.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::IngestConfig;
use crate::contract::{ContentsApi, EntryKind, RawFileRef, TreeEntry};
use crate::error::{IngestError, Result};
use crate::filter::is_allowed_path;
use crate::location::RepositoryLocation;

/// Bounds on one traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectLimits {
    pub max_depth: usize,
    pub max_entries: usize,
    pub request_timeout: Duration,
}

impl From<&IngestConfig> for CollectLimits {
    fn from(config: &IngestConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_entries: config.max_entries,
            request_timeout: config.request_timeout(),
        }
    }
}

/// The not-yet-visited entries of one listed directory.
struct Frame {
    depth: usize,
    entries: std::vec::IntoIter<TreeEntry>,
}

pub struct TreeCollector<'a, C: ContentsApi + ?Sized> {
    api: &'a C,
    raw_base_url: Url,
    limits: CollectLimits,
}

impl<'a, C: ContentsApi + ?Sized> TreeCollector<'a, C> {
    pub fn new(api: &'a C, raw_base_url: Url, limits: CollectLimits) -> Self {
        Self {
            api,
            raw_base_url,
            limits,
        }
    }

    /// Collect every allowed file under `root_path`, in discovery order.
    ///
    /// # Errors
    /// - [`IngestError::Listing`] if any listing call fails or times out, or the tree
    ///   exceeds the configured depth or entry limits.
    /// - [`IngestError::Cancelled`] if `cancel` fires mid-walk.
    pub async fn collect(
        &self,
        location: &RepositoryLocation,
        root_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawFileRef>> {
        info!(repository = %location, root_path, "Collecting repository tree");

        let mut visited = HashSet::from([normalize_path(root_path)]);
        let root_entries = self.list(location, root_path, cancel).await?;
        let mut listed = root_entries.len();
        self.check_entry_budget(root_path, listed)?;

        let mut stack = vec![Frame {
            depth: 0,
            entries: root_entries.into_iter(),
        }];
        let mut files = Vec::new();

        while let Some(frame) = stack.last_mut() {
            let depth = frame.depth;
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };

            match entry.kind {
                EntryKind::File => {
                    if is_allowed_path(&entry.path) {
                        let resolved_url = location.raw_url(&self.raw_base_url, &entry.path);
                        debug!(path = %entry.path, url = %resolved_url, "Accepted file");
                        files.push(RawFileRef {
                            path: entry.path,
                            resolved_url,
                        });
                    } else {
                        debug!(path = %entry.path, "Skipped file outside allow-list");
                    }
                }
                EntryKind::Directory => {
                    if !visited.insert(normalize_path(&entry.path)) {
                        debug!(path = %entry.path, "Skipping already visited directory");
                        continue;
                    }
                    if depth + 1 > self.limits.max_depth {
                        error!(path = %entry.path, max_depth = self.limits.max_depth, "Tree exceeds depth limit");
                        return Err(IngestError::listing(
                            &entry.path,
                            format!("directory depth exceeds limit of {}", self.limits.max_depth),
                        ));
                    }
                    let children = self.list(location, &entry.path, cancel).await?;
                    listed += children.len();
                    self.check_entry_budget(&entry.path, listed)?;
                    stack.push(Frame {
                        depth: depth + 1,
                        entries: children.into_iter(),
                    });
                }
            }
        }

        info!(
            repository = %location,
            directories = visited.len(),
            entries = listed,
            files = files.len(),
            "Repository tree collected"
        );
        Ok(files)
    }

    async fn list(
        &self,
        location: &RepositoryLocation,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TreeEntry>> {
        let call = async {
            tokio::time::timeout(
                self.limits.request_timeout,
                self.api.list_directory(location, path),
            )
            .await
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(path, "Tree collection cancelled");
                Err(IngestError::Cancelled)
            }
            outcome = call => match outcome {
                Ok(Ok(entries)) => Ok(entries),
                Ok(Err(source)) => {
                    error!(path, error = %source, "Directory listing failed");
                    Err(IngestError::listing(path, source))
                }
                Err(_) => {
                    error!(path, timeout = ?self.limits.request_timeout, "Directory listing timed out");
                    Err(IngestError::listing(
                        path,
                        format!("timed out after {:?}", self.limits.request_timeout),
                    ))
                }
            },
        }
    }

    fn check_entry_budget(&self, path: &str, listed: usize) -> Result<()> {
        if listed > self.limits.max_entries {
            error!(path, listed, max_entries = self.limits.max_entries, "Tree exceeds entry limit");
            return Err(IngestError::listing(
                path,
                format!("tree has more than {} entries", self.limits.max_entries),
            ));
        }
        Ok(())
    }
}

fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockContentsApi, RemoteError};
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw() -> Url {
        Url::parse("https://raw.githubusercontent.com").unwrap()
    }

    fn limits() -> CollectLimits {
        CollectLimits {
            max_depth: 8,
            max_entries: 100,
            request_timeout: Duration::from_secs(5),
        }
    }

    fn location() -> RepositoryLocation {
        RepositoryLocation::parse("https://github.com/acme/widget").unwrap()
    }

    fn paths(refs: &[RawFileRef]) -> Vec<&str> {
        refs.iter().map(|r| r.path.as_str()).collect()
    }

    #[tokio::test]
    async fn walks_pre_order_in_listing_order() {
        let mut api = MockContentsApi::new();
        api.expect_list_directory().returning(|_, path| {
            Ok(match path {
                "" => vec![
                    TreeEntry::file("README.md"),
                    TreeEntry::dir("cmd"),
                    TreeEntry::file("logo.png"),
                    TreeEntry::file("go.mod.txt"),
                ],
                "cmd" => vec![TreeEntry::dir("cmd/server"), TreeEntry::file("cmd/doc.go")],
                "cmd/server" => vec![TreeEntry::file("cmd/server/main.go")],
                other => panic!("unexpected listing of {other}"),
            })
        });

        let collector = TreeCollector::new(&api, raw(), limits());
        let refs = collector
            .collect(&location(), "", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            paths(&refs),
            vec!["README.md", "cmd/server/main.go", "cmd/doc.go", "go.mod.txt"]
        );
        assert_eq!(
            refs[1].resolved_url,
            "https://raw.githubusercontent.com/acme/widget/refs/heads/main/cmd/server/main.go"
        );
    }

    #[tokio::test]
    async fn root_listing_failure_returns_no_refs() {
        let mut api = MockContentsApi::new();
        api.expect_list_directory()
            .times(1)
            .returning(|_, _| Err("404 Not Found".into()));

        let collector = TreeCollector::new(&api, raw(), limits());
        let err = collector
            .collect(&location(), "", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Listing);
    }

    #[tokio::test]
    async fn nested_listing_failure_aborts_walk() {
        let mut api = MockContentsApi::new();
        api.expect_list_directory().returning(|_, path| match path {
            "" => Ok(vec![TreeEntry::dir("a"), TreeEntry::dir("b")]),
            "a" => Ok(vec![TreeEntry::dir("a/deep")]),
            "a/deep" => Err("connection reset".into()),
            other => panic!("walk should have stopped before listing {other}"),
        });

        let collector = TreeCollector::new(&api, raw(), limits());
        let err = collector
            .collect(&location(), "", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            IngestError::Listing { path, .. } => assert_eq!(path, "a/deep"),
            other => panic!("expected listing error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repeated_directories_are_listed_once() {
        let mut api = MockContentsApi::new();
        api.expect_list_directory()
            .withf(|_, path| path == "loop")
            .times(1)
            .returning(|_, _| Ok(vec![TreeEntry::dir("loop/"), TreeEntry::file("loop/a.rs")]));
        api.expect_list_directory()
            .withf(|_, path| path.is_empty())
            .times(1)
            .returning(|_, _| Ok(vec![TreeEntry::dir("loop")]));

        let collector = TreeCollector::new(&api, raw(), limits());
        let refs = collector
            .collect(&location(), "", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(paths(&refs), vec!["loop/a.rs"]);
    }

    #[tokio::test]
    async fn depth_limit_is_a_listing_error() {
        let mut api = MockContentsApi::new();
        api.expect_list_directory()
            .returning(|_, path| Ok(vec![TreeEntry::dir(format!("{path}/d").trim_start_matches('/'))]));

        let collector = TreeCollector::new(
            &api,
            raw(),
            CollectLimits {
                max_depth: 3,
                ..limits()
            },
        );
        let err = collector
            .collect(&location(), "", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Listing);
        assert!(err.to_string().contains("depth"));
    }

    #[tokio::test]
    async fn entry_limit_is_a_listing_error() {
        let mut api = MockContentsApi::new();
        api.expect_list_directory().returning(|_, _| {
            Ok((0..20).map(|i| TreeEntry::file(format!("f{i}.go"))).collect())
        });

        let collector = TreeCollector::new(
            &api,
            raw(),
            CollectLimits {
                max_entries: 10,
                ..limits()
            },
        );
        let err = collector
            .collect(&location(), "", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Listing);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_listing() {
        let api = MockContentsApi::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let collector = TreeCollector::new(&api, raw(), limits());
        let err = collector.collect(&location(), "", &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    /// Root holds `slow` then `after`; listing `slow` takes half a second.
    #[derive(Default)]
    struct SlowContents {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentsApi for SlowContents {
        async fn list_directory(
            &self,
            _location: &RepositoryLocation,
            path: &str,
        ) -> std::result::Result<Vec<TreeEntry>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match path {
                "" => Ok(vec![TreeEntry::dir("slow"), TreeEntry::dir("after")]),
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(vec![TreeEntry::file("slow/a.go")])
                }
                _ => Ok(Vec::new()),
            }
        }
    }

    #[tokio::test]
    async fn slow_listing_times_out_as_listing_error() {
        let api = SlowContents::default();
        let collector = TreeCollector::new(
            &api,
            raw(),
            CollectLimits {
                request_timeout: Duration::from_millis(20),
                ..limits()
            },
        );
        let err = collector
            .collect(&location(), "", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            IngestError::Listing { ref path, .. } => assert_eq!(path, "slow"),
            ref other => panic!("expected listing error, got {other:?}"),
        }
        assert!(err.to_string().contains("timed out"), "got {err}");
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelling_mid_listing_stops_the_walk() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let api = SlowContents::default();
        let collector = TreeCollector::new(&api, raw(), limits());
        let err = collector.collect(&location(), "", &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        // `after` is never listed.
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn normalize_path_drops_empty_segments() {
        assert_eq!(normalize_path("/src//lib/./"), "src/lib");
        assert_eq!(normalize_path(""), "");
    }
}
