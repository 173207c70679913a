//! Artifact cache for remote indices and feeds.
//!
//! Entries are keyed by URL and trusted for a configurable window. Within
//! the window a cached copy is served without touching the network; past it
//! the entry is downloaded again. A zero window forces a fresh fetch.
//!
//! # Layout
//!
//! ```text
//! <cache-dir>/
//! └── v1/
//!     ├── 5f1c...e2   # sha256 of the URL
//!     └── 9a0b...7d
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

use crate::util::hash::sha256_str;

/// Default trust window for cached entries.
pub const DEFAULT_TRUST_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Default network timeout for downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error fetching an artifact.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to download `{url}`: {message}")]
    Download { url: String, message: String },

    #[error("`{url}` is not cached and offline mode is enabled")]
    Offline { url: String },

    #[error("unsupported URL scheme `{scheme}` for `{url}`")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("cache I/O error for `{url}`: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// The URL that failed.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Download { url, .. }
            | FetchError::Offline { url }
            | FetchError::UnsupportedScheme { url, .. }
            | FetchError::Io { url, .. } => url,
        }
    }
}

/// A cache of downloaded artifacts.
///
/// Implementations must tolerate concurrent `fetch` calls for the same URL;
/// two racing writers may both download, but the resulting entry is one of
/// the complete downloads.
pub trait ArtifactCache: Send + Sync + fmt::Debug {
    /// Get a local copy of `url`, downloading it if the cached copy is
    /// older than the trust window.
    fn fetch(&self, url: &Url) -> Result<PathBuf, FetchError>;

    /// How long a cached entry is trusted.
    fn trust_window(&self) -> Duration;

    /// A view of this cache with a different trust window.
    ///
    /// The original cache is unaffected.
    fn with_trust_window(&self, trust_window: Duration) -> Box<dyn ArtifactCache>;
}

/// File-backed artifact cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Cache root directory
    dir: PathBuf,

    /// How long entries are served without refetching
    trust_window: Duration,

    /// Serve any cached entry and never download
    offline: bool,

    /// Network timeout
    timeout: Duration,
}

impl FileCache {
    /// Create a cache rooted at `dir` with the default trust window.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache {
            dir: dir.into(),
            trust_window: DEFAULT_TRUST_WINDOW,
            offline: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the network timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the trust window.
    pub fn trust_window_of(mut self, trust_window: Duration) -> Self {
        self.trust_window = trust_window;
        self
    }

    /// Get the cache root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path of the entry for `url`.
    pub fn entry_path(&self, url: &Url) -> PathBuf {
        self.dir.join("v1").join(sha256_str(url.as_str()))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        if self.trust_window.is_zero() {
            return false;
        }

        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return false,
        };

        match SystemTime::now().duration_since(modified) {
            Ok(age) => age <= self.trust_window,
            // Modified in the future (clock skew): treat as fresh.
            Err(_) => true,
        }
    }

    fn download(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|_| FetchError::Download {
                    url: url.to_string(),
                    message: "not a local file path".to_string(),
                })?;
                std::fs::read(&path).map_err(|e| FetchError::Download {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            "http" | "https" => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .user_agent(concat!("crossbuild/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .map_err(|e| download_error(url, e))?;

                let response = client
                    .get(url.as_str())
                    .send()
                    .map_err(|e| download_error(url, e))?;

                if !response.status().is_success() {
                    return Err(FetchError::Download {
                        url: url.to_string(),
                        message: format!("HTTP {}", response.status()),
                    });
                }

                let bytes = response.bytes().map_err(|e| download_error(url, e))?;
                Ok(bytes.to_vec())
            }
            scheme => Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
                scheme: scheme.to_string(),
            }),
        }
    }

    fn store(&self, url: &Url, path: &Path, contents: &[u8]) -> Result<(), FetchError> {
        let io_error = |source: std::io::Error| FetchError::Io {
            url: url.to_string(),
            source,
        };

        let parent = path.parent().unwrap_or(self.dir.as_path());
        std::fs::create_dir_all(parent).map_err(io_error)?;

        // Write to a sibling temp file and rename so readers never see a
        // partial entry.
        let mut tmp = NamedTempFile::new_in(parent).map_err(io_error)?;
        tmp.write_all(contents).map_err(io_error)?;
        tmp.persist(path).map_err(|e| io_error(e.error))?;

        Ok(())
    }
}

impl ArtifactCache for FileCache {
    fn fetch(&self, url: &Url) -> Result<PathBuf, FetchError> {
        let path = self.entry_path(url);

        if path.exists() && (self.offline || self.is_fresh(&path)) {
            tracing::debug!("Cache hit for {}", url);
            return Ok(path);
        }

        if self.offline {
            return Err(FetchError::Offline {
                url: url.to_string(),
            });
        }

        tracing::debug!(
            "Fetching {} (trust window: {}s)",
            url,
            self.trust_window.as_secs()
        );
        let contents = self.download(url)?;
        self.store(url, &path, &contents)?;

        Ok(path)
    }

    fn trust_window(&self) -> Duration {
        self.trust_window
    }

    fn with_trust_window(&self, trust_window: Duration) -> Box<dyn ArtifactCache> {
        Box::new(self.clone().trust_window_of(trust_window))
    }
}

fn download_error(url: &Url, err: reqwest::Error) -> FetchError {
    FetchError::Download {
        url: url.to_string(),
        message: err.to_string(),
    }
}
