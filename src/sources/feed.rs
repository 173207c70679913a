//! Compiler release feeds.
//!
//! Feeds answer two questions: which releases exist, and which nightly
//! builds exist. The resolver only talks to the [`NightlyFeedResolver`] and
//! [`StableFeedResolver`] traits; [`ReleaseFeed`] implements both over a
//! JSON listing fetched through an [`ArtifactCache`]:
//!
//! ```json
//! {
//!   "releases": ["2.13.16", "3.6.4", "3.7.0-RC1"],
//!   "nightlies": ["3.7.1-RC1-bin-20250401-abc1234-NIGHTLY"]
//! }
//! ```

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::core::version::{CompilerVersion, ReleaseLine};
use crate::sources::cache::{ArtifactCache, FetchError};

/// Error answering a feed query.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed was reachable but does not contain what was asked for.
    #[error("`{0}` not found in release feed")]
    NotFound(String),

    /// The feed could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The feed was fetched but could not be read.
    #[error("malformed release feed `{url}`: {message}")]
    Malformed { url: String, message: String },
}

/// Lookup of nightly and other non-stable builds.
pub trait NightlyFeedResolver: Send + Sync {
    /// Latest nightly build of a release line.
    fn latest_nightly(&self, line: &ReleaseLine) -> Result<String, FeedError>;

    /// Check that a nightly or pre-release build exists.
    fn check_nightly_exists(&self, version: &str) -> Result<(), FeedError>;
}

/// Lookup of stable releases.
pub trait StableFeedResolver: Send + Sync {
    /// All known releases, oldest first.
    fn all_stable_versions(&self) -> Result<Vec<String>, FeedError>;

    /// Check that a release exists.
    fn validate_stable_exists(&self, version: &str) -> Result<(), FeedError>;
}

/// Release listing as published by the feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseListing {
    /// Published releases, final and pre-release
    pub releases: Vec<String>,

    /// Published nightly builds
    pub nightlies: Vec<String>,
}

/// A JSON release feed read through an artifact cache.
///
/// The listing is fetched once per feed instance.
#[derive(Debug)]
pub struct ReleaseFeed {
    url: Url,
    cache: Arc<dyn ArtifactCache>,
    listing: OnceLock<ReleaseListing>,
}

impl ReleaseFeed {
    /// Create a feed reading `url` through `cache`.
    pub fn new(url: Url, cache: Arc<dyn ArtifactCache>) -> Self {
        ReleaseFeed {
            url,
            cache,
            listing: OnceLock::new(),
        }
    }

    /// Get the feed URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn listing(&self) -> Result<&ReleaseListing, FeedError> {
        if let Some(listing) = self.listing.get() {
            return Ok(listing);
        }

        let path = self.cache.fetch(&self.url)?;
        let contents = std::fs::read_to_string(&path).map_err(|e| FeedError::Malformed {
            url: self.url.to_string(),
            message: e.to_string(),
        })?;
        let listing: ReleaseListing =
            serde_json::from_str(&contents).map_err(|e| FeedError::Malformed {
                url: self.url.to_string(),
                message: e.to_string(),
            })?;

        // A concurrent caller may have filled the slot first; either value
        // comes from the same cache entry.
        Ok(self.listing.get_or_init(|| listing))
    }
}

impl NightlyFeedResolver for ReleaseFeed {
    fn latest_nightly(&self, line: &ReleaseLine) -> Result<String, FeedError> {
        let listing = self.listing()?;
        listing
            .nightlies
            .iter()
            .map(|v| CompilerVersion::new(v.as_str()))
            .filter(|v| line.contains(v))
            .max()
            .map(|v| v.to_string())
            .ok_or_else(|| FeedError::NotFound(format!("{}.nightly", line)))
    }

    fn check_nightly_exists(&self, version: &str) -> Result<(), FeedError> {
        let listing = self.listing()?;
        let known = listing.nightlies.iter().any(|v| v == version)
            || listing
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

impl StableFeedResolver for ReleaseFeed {
    fn all_stable_versions(&self) -> Result<Vec<String>, FeedError> {
        let listing = self.listing()?;
        let mut versions: Vec<CompilerVersion> = listing
            .releases
            .iter()
            .map(|v| CompilerVersion::new(v.as_str()))
            .collect();
        versions.sort();
        Ok(versions.into_iter().map(|v| v.to_string()).collect())
    }

    fn validate_stable_exists(&self, version: &str) -> Result<(), FeedError> {
        let listing = self.listing()?;
        if listing.releases.iter().any(|v| v == version) {
            Ok(())
        } else {
            Err(FeedError::NotFound(version.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::cache::FileCache;
    use tempfile::TempDir;

    fn feed(tmp: &TempDir, json: &str) -> ReleaseFeed {
        let path = tmp.path().join("releases.json");
        std::fs::write(&path, json).unwrap();
        let cache: Arc<dyn ArtifactCache> = Arc::new(FileCache::new(tmp.path().join("cache")));
        ReleaseFeed::new(Url::from_file_path(&path).unwrap(), cache)
    }

    const LISTING: &str = r#"{
        "releases": ["3.6.4", "2.13.16", "3.7.0-RC1", "3.10.0"],
        "nightlies": [
            "3.4.0-NIGHTLY",
            "3.7.1-RC1-bin-20250401-abc1234-NIGHTLY",
            "3.7.1-RC1-bin-20250402-def5678-NIGHTLY",
            "2.13.17-bin-3a2a5f6"
        ]
    }"#;

    #[test]
    fn test_all_stable_versions_sorted() {
        let tmp = TempDir::new().unwrap();
        let feed = feed(&tmp, LISTING);

        let versions = feed.all_stable_versions().unwrap();
        assert_eq!(versions, ["2.13.16", "3.6.4", "3.7.0-RC1", "3.10.0"]);
    }

    #[test]
    fn test_latest_nightly_per_line() {
        let tmp = TempDir::new().unwrap();
        let feed = feed(&tmp, LISTING);

        assert_eq!(
            feed.latest_nightly(&ReleaseLine::major(3)).unwrap(),
            "3.7.1-RC1-bin-20250402-def5678-NIGHTLY"
        );
        assert_eq!(
            feed.latest_nightly(&ReleaseLine::minor(3, 4)).unwrap(),
            "3.4.0-NIGHTLY"
        );
        assert_eq!(
            feed.latest_nightly(&ReleaseLine::major(2)).unwrap(),
            "2.13.17-bin-3a2a5f6"
        );
        assert!(matches!(
            feed.latest_nightly(&ReleaseLine::minor(3, 9)),
            Err(FeedError::NotFound(_))
        ));
    }

    #[test]
    fn test_check_nightly_exists() {
        let tmp = TempDir::new().unwrap();
        let feed = feed(&tmp, LISTING);

        assert!(feed.check_nightly_exists("3.4.0-NIGHTLY").is_ok());
        assert!(feed.check_nightly_exists("3.7.0-RC1").is_ok());
        assert!(matches!(
            feed.check_nightly_exists("3.6.4"),
            Err(FeedError::NotFound(_))
        ));
        assert!(matches!(
            feed.check_nightly_exists("3.9.0-RC9"),
            Err(FeedError::NotFound(_))
        ));
    }

    #[test]
    fn test_validate_stable_exists() {
        let tmp = TempDir::new().unwrap();
        let feed = feed(&tmp, LISTING);

        assert!(feed.validate_stable_exists("3.6.4").is_ok());
        assert!(matches!(
            feed.validate_stable_exists("2.13.8"),
            Err(FeedError::NotFound(v)) if v == "2.13.8"
        ));
    }

    #[test]
    fn test_unreachable_feed_is_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let cache: Arc<dyn ArtifactCache> = Arc::new(FileCache::new(tmp.path().join("cache")));
        let url = Url::from_file_path(tmp.path().join("missing.json")).unwrap();
        let feed = ReleaseFeed::new(url, cache);

        assert!(matches!(
            feed.validate_stable_exists("3.6.4"),
            Err(FeedError::Fetch(_))
        ));
    }

    #[test]
    fn test_malformed_feed() {
        let tmp = TempDir::new().unwrap();
        let feed = feed(&tmp, "not json");

        assert!(matches!(
            feed.all_stable_versions(),
            Err(FeedError::Malformed { .. })
        ));
    }
}
