//! Test utilities and mocks for crossbuild unit tests.
//!
//! This module provides mock implementations of the network-facing seams:
//! the artifact cache and the release feeds.
//!
//! # Example
//!
//! ```rust,ignore
//! use crossbuild::test_support::{MockCache, MockFeed};
//!
//! #[test]
//! fn test_example() {
//!     // Stale entry is broken, a forced refetch succeeds.
//!     let cache = MockCache::new().with_cached("{ not json").with_fresh("[]");
//!     let feed = MockFeed::new().with_releases(&["3.6.4"]);
//!
//!     // Use mocks in tests...
//!     assert!(cache.calls().is_empty());
//! }
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tempfile::TempDir;
use url::Url;

use crate::core::version::{CompilerVersion, ReleaseLine};
use crate::sources::cache::{ArtifactCache, FetchError, DEFAULT_TRUST_WINDOW};
use crate::sources::feed::{FeedError, NightlyFeedResolver, StableFeedResolver};

#[derive(Debug, Default)]
struct MockCacheState {
    /// Served when the trust window is non-zero
    cached: Option<String>,
    /// Served when the trust window is zero (forced refetch)
    fresh: Option<String>,
    /// Trust window of every fetch, in call order
    calls: Vec<Duration>,
    /// Files written so far
    written: usize,
}

/// Mock artifact cache.
///
/// A fetch with a non-zero trust window serves the "cached" entry; a fetch
/// with a zero window serves the "fresh" one. A missing entry fails as a
/// download error. Views created by `with_trust_window` share call history
/// with the original.
#[derive(Debug, Clone)]
pub struct MockCache {
    state: Arc<Mutex<MockCacheState>>,
    dir: Arc<TempDir>,
    trust_window: Duration,
}

impl MockCache {
    /// Create a cache with no entries.
    pub fn new() -> Self {
        MockCache {
            state: Arc::new(Mutex::new(MockCacheState::default())),
            dir: Arc::new(TempDir::new().expect("failed to create temp dir")),
            trust_window: DEFAULT_TRUST_WINDOW,
        }
    }

    /// Serve `contents` for fetches within the trust window.
    pub fn with_cached(self, contents: &str) -> Self {
        self.state().cached = Some(contents.to_string());
        self
    }

    /// Serve `contents` for forced refetches.
    pub fn with_fresh(self, contents: &str) -> Self {
        self.state().fresh = Some(contents.to_string());
        self
    }

    /// Trust window of every fetch so far, in call order.
    pub fn calls(&self) -> Vec<Duration> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockCacheState> {
        self.state.lock().expect("mock cache lock poisoned")
    }
}

impl Default for MockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactCache for MockCache {
    fn fetch(&self, url: &Url) -> Result<PathBuf, FetchError> {
        let mut state = self.state();
        state.calls.push(self.trust_window);

        let entry = if self.trust_window.is_zero() {
            state.fresh.clone()
        } else {
            state.cached.clone()
        };

        let contents = entry.ok_or_else(|| FetchError::Download {
            url: url.to_string(),
            message: "connection refused".to_string(),
        })?;

        state.written += 1;
        let path = self.dir.path().join(format!("entry-{}", state.written));
        std::fs::write(&path, contents).map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })?;

        Ok(path)
    }

    fn trust_window(&self) -> Duration {
        self.trust_window
    }

    fn with_trust_window(&self, trust_window: Duration) -> Box<dyn ArtifactCache> {
        Box::new(MockCache {
            state: Arc::clone(&self.state),
            dir: Arc::clone(&self.dir),
            trust_window,
        })
    }
}

/// Mock release feed implementing both feed traits.
#[derive(Debug, Clone, Default)]
pub struct MockFeed {
    releases: Vec<String>,
    nightlies: Vec<String>,
    unreachable: bool,
}

impl MockFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add published releases.
    pub fn with_releases(mut self, versions: &[&str]) -> Self {
        self.releases.extend(versions.iter().map(|v| v.to_string()));
        self
    }

    /// Add published nightly builds.
    pub fn with_nightlies(mut self, versions: &[&str]) -> Self {
        self.nightlies.extend(versions.iter().map(|v| v.to_string()));
        self
    }

    /// Make every query fail as if the feed host were down.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    fn check_reachable(&self) -> Result<(), FeedError> {
        if self.unreachable {
            return Err(FeedError::Fetch(FetchError::Download {
                url: "https://feed.invalid/releases.json".to_string(),
                message: "connection refused".to_string(),
            }));
        }
        Ok(())
    }
}

impl NightlyFeedResolver for MockFeed {
    fn latest_nightly(&self, line: &ReleaseLine) -> Result<String, FeedError> {
        self.check_reachable()?;
        self.nightlies
            .iter()
            .map(|v| CompilerVersion::new(v.as_str()))
            .filter(|v| line.contains(v))
            .max()
            .map(|v| v.to_string())
            .ok_or_else(|| FeedError::NotFound(format!("{}.nightly", line)))
    }

    fn check_nightly_exists(&self, version: &str) -> Result<(), FeedError> {
        self.check_reachable()?;
        let known = self.nightlies.iter().any(|v| v == version)
            || self
                .releases
                .iter()
                .any(|v| v == version && !CompilerVersion::new(v.as_str()).is_stable());
        if known {
            Ok(())
        } else {
            Err(FeedError::NotFound(version.to_string()))
        }
    }
}

impl StableFeedResolver for MockFeed {
    fn all_stable_versions(&self) -> Result<Vec<String>, FeedError> {
        self.check_reachable()?;
        let mut versions: Vec<CompilerVersion> = self
            .releases
            .iter()
            .map(|v| CompilerVersion::new(v.as_str()))
            .collect();
        versions.sort();
        Ok(versions.into_iter().map(|v| v.to_string()).collect())
    }

    fn validate_stable_exists(&self, version: &str) -> Result<(), FeedError> {
        self.check_reachable()?;
        if self.releases.iter().any(|v| v == version) {
            Ok(())
        } else {
            Err(FeedError::NotFound(version.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.com/index.json").unwrap()
    }

    #[test]
    fn test_mock_cache_serves_by_window() {
        let cache = MockCache::new().with_cached("old").with_fresh("new");

        let path = cache.fetch(&url()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "old");

        let fresh = cache.with_trust_window(Duration::ZERO);
        let path = fresh.fetch(&url()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");

        assert_eq!(cache.calls(), vec![DEFAULT_TRUST_WINDOW, Duration::ZERO]);
    }

    #[test]
    fn test_mock_cache_missing_entry_fails() {
        let cache = MockCache::new();
        assert!(matches!(
            cache.fetch(&url()),
            Err(FetchError::Download { .. })
        ));
    }

    #[test]
    fn test_mock_feed_unreachable() {
        let feed = MockFeed::new().with_releases(&["3.6.4"]).unreachable();
        assert!(matches!(
            feed.validate_stable_exists("3.6.4"),
            Err(FeedError::Fetch(_))
        ));
    }
}
