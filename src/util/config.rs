//! Configuration file support for crossbuild.
//!
//! crossbuild supports two configuration file locations:
//! - Global: `~/.crossbuild/config.toml` - User-wide defaults
//! - Project: `.crossbuild/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.
//!
//! Global build-configuration defaults (compiler options shared by every
//! project) live next to it in `~/.crossbuild/defaults.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::sources::cache::{DEFAULT_TIMEOUT, DEFAULT_TRUST_WINDOW};

/// Default location of the supported-versions index.
pub const DEFAULT_SUPPORTED_VERSIONS_URL: &str =
    "https://raw.githubusercontent.com/crossbuild/crossbuild/main/website/supported-versions.json";

/// Default location of the compiler release feed.
pub const DEFAULT_RELEASE_FEED_URL: &str =
    "https://raw.githubusercontent.com/crossbuild/crossbuild/main/website/releases.json";

/// crossbuild configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote index settings
    pub index: IndexConfig,

    /// Network settings
    pub net: NetConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// Remote index settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// URL of the supported-versions index
    pub supported_versions_url: Option<String>,

    /// URL of the compiler release feed
    pub release_feed_url: Option<String>,

    /// How long cached index files are trusted, in seconds
    pub trust_window_secs: Option<u64>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Download timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Offline mode (don't fetch from network)
    #[serde(default)]
    pub offline: bool,
}

/// Cache-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (defaults to the platform cache dir)
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Index settings
        if other.index.supported_versions_url.is_some() {
            self.index.supported_versions_url = other.index.supported_versions_url;
        }
        if other.index.release_feed_url.is_some() {
            self.index.release_feed_url = other.index.release_feed_url;
        }
        if other.index.trust_window_secs.is_some() {
            self.index.trust_window_secs = other.index.trust_window_secs;
        }

        // Net settings
        if other.net.timeout_secs.is_some() {
            self.net.timeout_secs = other.net.timeout_secs;
        }
        if other.net.offline {
            self.net.offline = true;
        }

        // Cache settings
        if other.cache.dir.is_some() {
            self.cache.dir = other.cache.dir;
        }
    }

    /// URL of the supported-versions index.
    pub fn supported_versions_url(&self) -> Result<Url> {
        let raw = self
            .index
            .supported_versions_url
            .as_deref()
            .unwrap_or(DEFAULT_SUPPORTED_VERSIONS_URL);
        parse_url(raw)
    }

    /// URL of the compiler release feed.
    pub fn release_feed_url(&self) -> Result<Url> {
        let raw = self
            .index
            .release_feed_url
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE_FEED_URL);
        parse_url(raw)
    }

    /// Trust window for cached index files.
    pub fn trust_window(&self) -> Duration {
        self.index
            .trust_window_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TRUST_WINDOW)
    }

    /// Download timeout.
    pub fn timeout(&self) -> Duration {
        self.net
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Accept URLs or plain local paths.
fn parse_url(raw: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(raw) {
        return Ok(url);
    }

    let path = std::path::absolute(raw)
        .with_context(|| format!("invalid index location: {}", raw))?;
    Url::from_file_path(&path).map_err(|_| anyhow::anyhow!("invalid index location: {}", raw))
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.crossbuild/config.toml)
/// 2. Global config (~/.crossbuild/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global crossbuild config directory (~/.crossbuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".crossbuild"))
}

/// Get the global config path (~/.crossbuild/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the global build-configuration defaults path (~/.crossbuild/defaults.toml).
pub fn global_defaults_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("defaults.toml"))
}

/// Get the project config path (.crossbuild/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".crossbuild").join("config.toml")
}
