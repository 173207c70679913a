//! Global context for crossbuild operations.
//!
//! Provides centralized access to configuration, paths, and the process
//! environment. The environment is read once here and passed down; nothing
//! below this layer reads environment variables.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::sources::cache::{ArtifactCache, FileCache};
use crate::sources::feed::ReleaseFeed;
use crate::sources::index::RemoteVersionIndex;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Environment variable signalling a continuous-integration run.
pub const CI_ENV: &str = "CI";

/// Project directories for crossbuild
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "crossbuild", "crossbuild"));

/// Facts about the running process that influence resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Running under continuous integration
    pub ci: bool,

    /// Version of the running tool
    pub tool_version: String,
}

impl Environment {
    /// Environment for a given tool version, outside CI.
    pub fn new(tool_version: impl Into<String>) -> Self {
        Environment {
            ci: false,
            tool_version: tool_version.into(),
        }
    }

    /// Set the CI flag.
    pub fn with_ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    /// Read the environment of the current process.
    pub fn from_process() -> Self {
        let ci = std::env::var(CI_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Environment::new(env!("CARGO_PKG_VERSION")).with_ci(ci)
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no"
    )
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Cache directory for downloaded indices
    cache_dir: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Process environment
    env: Environment,

    /// Merged tool configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let global = global_config_path().unwrap_or_else(|| PathBuf::from(".crossbuild/config.toml"));
        let config = load_config(&global, &project_config_path(&cwd));

        Ok(Self::with_config(cwd, config, Environment::from_process()))
    }

    /// Create a context with explicit configuration and environment.
    pub fn with_config(cwd: PathBuf, config: Config, env: Environment) -> Self {
        let cache_dir = match config.cache.dir.clone() {
            Some(dir) => dir,
            None => default_cache_dir(),
        };

        GlobalContext {
            cwd,
            cache_dir,
            verbose: false,
            env,
            config,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set offline mode.
    pub fn set_offline(&mut self, offline: bool) {
        self.config.net.offline = offline;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the process environment.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The artifact cache configured for this context.
    pub fn artifact_cache(&self) -> Arc<dyn ArtifactCache> {
        Arc::new(
            FileCache::new(&self.cache_dir)
                .offline(self.config.net.offline)
                .timeout(self.config.timeout())
                .trust_window_of(self.config.trust_window()),
        )
    }

    /// The supported-versions index for the running tool.
    pub fn version_index(&self, cache: Arc<dyn ArtifactCache>) -> Result<RemoteVersionIndex> {
        let url = self.config.supported_versions_url()?;
        Ok(RemoteVersionIndex::new(url, cache, &self.env))
    }

    /// The compiler release feed.
    pub fn release_feed(&self, cache: Arc<dyn ArtifactCache>) -> Result<ReleaseFeed> {
        let url = self.config.release_feed_url()?;
        Ok(ReleaseFeed::new(url, cache))
    }
}

fn default_cache_dir() -> PathBuf {
    if let Some(dirs) = PROJECT_DIRS.as_ref() {
        dirs.cache_dir().to_path_buf()
    } else {
        // Fallback to ~/.crossbuild/cache
        directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".crossbuild").join("cache"))
            .unwrap_or_else(|| PathBuf::from(".crossbuild/cache"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_environment_builder() {
        let env = Environment::new("1.2.3").with_ci(true);
        assert!(env.ci);
        assert_eq!(env.tool_version, "1.2.3");
    }

    #[test]
    fn test_context_cache_dir_from_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(tmp.path().join("cache"));

        let ctx = GlobalContext::with_config(
            tmp.path().to_path_buf(),
            config,
            Environment::new("0.1.0"),
        );
        assert_eq!(ctx.cache_dir(), tmp.path().join("cache"));
        assert_eq!(ctx.cwd(), tmp.path());
    }

    #[test]
    fn test_context_builds_index_and_feed() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.index.release_feed_url = Some("https://example.com/releases.json".to_string());

        let ctx = GlobalContext::with_config(
            tmp.path().to_path_buf(),
            config,
            Environment::new("0.1.0"),
        );
        let cache = ctx.artifact_cache();
        let feed = ctx.release_feed(cache.clone()).unwrap();
        let index = ctx.version_index(cache).unwrap();

        assert_eq!(feed.url().as_str(), "https://example.com/releases.json");
        assert_eq!(
            index.url().as_str(),
            crate::util::config::DEFAULT_SUPPORTED_VERSIONS_URL
        );
    }
}
