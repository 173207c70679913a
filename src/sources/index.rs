//! Remote index of supported compiler versions.
//!
//! Each release of the tool publishes which compiler versions it supports:
//!
//! ```json
//! [
//!   { "toolVersion": "0.1.0", "supportedCompilerVersions": ["2.13.16", "3.6.4"] },
//!   { "toolVersion": "0.2.0", "supportedCompilerVersions": ["2.13.16", "3.7.0"] }
//! ]
//! ```
//!
//! The list is an allow-list ceiling: it bounds which version is picked by
//! default, it never decides which version an explicit request gets.
//!
//! Fetch policy:
//! - Outside CI the index is read through the cache's trust window; if that
//!   fails it is retried once with a zero window (forced refetch).
//! - In CI the index is always fetched fresh, without the cached attempt.
//! - If both fail, or no record applies, the built-in table is used.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::core::version::{adjusted_tool_version, parse_version_lenient, CompilerVersion};
use crate::sources::cache::{ArtifactCache, FetchError};
use crate::sources::defaults::default_supported_versions;
use crate::util::context::Environment;

/// Error reading the supported-versions index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed supported-versions index `{url}`: {message}")]
    Malformed { url: String, message: String },
}

/// One entry of the supported-versions index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedVersionsRecord {
    /// Release of the tool this record describes
    pub tool_version: String,

    /// Compiler versions certified for that release
    pub supported_compiler_versions: Vec<String>,
}

impl SupportedVersionsRecord {
    /// Orderable form of the tool version.
    pub fn tool_version_key(&self) -> Option<Version> {
        parse_version_lenient(&self.tool_version)
    }
}

/// Where an allow-list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowListSource {
    /// The remote record for this tool version (or the nearest older one)
    Remote { tool_version: String },
    /// The built-in table
    Default,
}

/// The allow-list of supported compiler versions, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersions {
    versions: Vec<CompilerVersion>,
    source: AllowListSource,
}

impl SupportedVersions {
    fn new(mut versions: Vec<CompilerVersion>, source: AllowListSource) -> Self {
        versions.sort();
        versions.dedup();
        SupportedVersions { versions, source }
    }

    /// The built-in allow-list.
    pub fn defaults() -> Self {
        SupportedVersions::new(default_supported_versions(), AllowListSource::Default)
    }

    /// Supported versions, oldest first.
    pub fn versions(&self) -> &[CompilerVersion] {
        &self.versions
    }

    /// The newest supported version.
    pub fn ceiling(&self) -> Option<&CompilerVersion> {
        self.versions.last()
    }

    /// Whether `version` is on the list.
    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.as_str() == version)
    }

    /// Where the list came from.
    pub fn source(&self) -> &AllowListSource {
        &self.source
    }

    /// Whether the built-in table was used.
    pub fn is_default(&self) -> bool {
        self.source == AllowListSource::Default
    }

    /// Versions as plain strings, for diagnostics.
    pub fn to_strings(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.to_string()).collect()
    }
}

/// Supported-versions index for the running tool.
///
/// The allow-list is computed on first access and then reused, so every
/// resolution sharing an index sees the same snapshot.
#[derive(Debug)]
pub struct RemoteVersionIndex {
    url: Url,
    cache: Arc<dyn ArtifactCache>,
    tool_version: String,
    ci: bool,
    supported: OnceLock<SupportedVersions>,
}

impl RemoteVersionIndex {
    /// Create an index reading `url` through `cache`.
    pub fn new(url: Url, cache: Arc<dyn ArtifactCache>, env: &Environment) -> Self {
        RemoteVersionIndex {
            url,
            cache,
            tool_version: env.tool_version.clone(),
            ci: env.ci,
            supported: OnceLock::new(),
        }
    }

    /// Get the index URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The allow-list for the running tool version. Never empty.
    pub fn supported_versions(&self) -> &SupportedVersions {
        self.supported.get_or_init(|| self.compute_supported_versions())
    }

    fn compute_supported_versions(&self) -> SupportedVersions {
        let records = match self.fetch_records() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    "Could not read supported compiler versions ({}), using built-in list",
                    e
                );
                return SupportedVersions::defaults();
            }
        };

        match select_record(&records, &self.tool_version) {
            Some(record) => {
                tracing::debug!(
                    "Using supported compiler versions of tool version {}",
                    record.tool_version
                );
                SupportedVersions::new(
                    record
                        .supported_compiler_versions
                        .iter()
                        .map(|v| CompilerVersion::new(v.as_str()))
                        .collect(),
                    AllowListSource::Remote {
                        tool_version: record.tool_version.clone(),
                    },
                )
            }
            None => {
                tracing::warn!(
                    "No supported-versions record applies to tool version {}, using built-in list",
                    self.tool_version
                );
                SupportedVersions::defaults()
            }
        }
    }

    fn fetch_records(&self) -> Result<Vec<SupportedVersionsRecord>, IndexError> {
        if self.ci {
            tracing::debug!("CI environment, fetching {} without cache", self.url);
            let fresh = self.cache.with_trust_window(Duration::ZERO);
            return self.read_records(fresh.as_ref());
        }

        match self.read_records(self.cache.as_ref()) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    "Failed to read supported compiler versions ({}), retrying with a fresh download",
                    e
                );
                let fresh = self.cache.with_trust_window(Duration::ZERO);
                self.read_records(fresh.as_ref())
            }
        }
    }

    fn read_records(
        &self,
        cache: &dyn ArtifactCache,
    ) -> Result<Vec<SupportedVersionsRecord>, IndexError> {
        let path = cache.fetch(&self.url)?;
        let malformed = |message: String| IndexError::Malformed {
            url: self.url.to_string(),
            message,
        };

        let contents = std::fs::read_to_string(&path).map_err(|e| malformed(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| malformed(e.to_string()))
    }
}

/// Pick the record that applies to `tool_version`.
///
/// An exact match wins. Otherwise the tool version is adjusted (see
/// [`adjusted_tool_version`]) and the newest record not newer than it is
/// used. Records without versions are ignored.
pub fn select_record<'a>(
    records: &'a [SupportedVersionsRecord],
    tool_version: &str,
) -> Option<&'a SupportedVersionsRecord> {
    let usable = || {
        records
            .iter()
            .filter(|r| !r.supported_compiler_versions.is_empty())
    };

    if let Some(record) = usable().find(|r| r.tool_version == tool_version) {
        return Some(record);
    }

    let current = adjusted_tool_version(tool_version)?;
    usable()
        .filter_map(|r| r.tool_version_key().map(|key| (key, r)))
        .filter(|(key, _)| *key <= current)
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, r)| r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockCache;

    const INDEX: &str = r#"[
        { "toolVersion": "0.1.0", "supportedCompilerVersions": ["2.13.15", "3.5.2"] },
        { "toolVersion": "0.2.0", "supportedCompilerVersions": ["3.6.4", "2.13.16"] },
        { "toolVersion": "0.4.0", "supportedCompilerVersions": ["3.7.0"] }
    ]"#;

    fn record(tool: &str, versions: &[&str]) -> SupportedVersionsRecord {
        SupportedVersionsRecord {
            tool_version: tool.to_string(),
            supported_compiler_versions: versions.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn index(cache: MockCache, tool_version: &str, ci: bool) -> RemoteVersionIndex {
        let env = Environment::new(tool_version).with_ci(ci);
        RemoteVersionIndex::new(
            Url::parse("https://example.com/supported-versions.json").unwrap(),
            Arc::new(cache),
            &env,
        )
    }

    #[test]
    fn test_select_exact_record() {
        let records = vec![record("0.1.0", &["3.5.2"]), record("0.2.0", &["3.6.4"])];
        let selected = select_record(&records, "0.2.0").unwrap();
        assert_eq!(selected.tool_version, "0.2.0");
    }

    #[test]
    fn test_select_nearest_older_record() {
        let records = vec![
            record("0.1.0", &["3.5.2"]),
            record("0.2.0", &["3.6.4"]),
            record("0.4.0", &["3.7.0"]),
        ];
        assert_eq!(
            select_record(&records, "0.3.1").unwrap().tool_version,
            "0.2.0"
        );
        assert_eq!(
            select_record(&records, "0.3.0-SNAPSHOT").unwrap().tool_version,
            "0.2.0"
        );
    }

    #[test]
    fn test_select_commit_distance_bumps_patch() {
        let records = vec![record("0.2.0", &["3.6.4"]), record("0.2.1", &["3.7.0"])];
        // Built after the 0.2.0 tag, so 0.2.1's record applies.
        assert_eq!(
            select_record(&records, "0.2.0-4-gabcdef0").unwrap().tool_version,
            "0.2.1"
        );
        assert_eq!(
            select_record(&records, "0.2.0-SNAPSHOT").unwrap().tool_version,
            "0.2.0"
        );
    }

    #[test]
    fn test_select_none_when_all_newer() {
        let records = vec![record("0.2.0", &["3.6.4"])];
        assert!(select_record(&records, "0.1.9").is_none());
        assert!(select_record(&records, "dev").is_none());
    }

    #[test]
    fn test_select_skips_empty_records() {
        let records = vec![record("0.1.0", &["3.5.2"]), record("0.2.0", &[])];
        assert_eq!(
            select_record(&records, "0.2.0").unwrap().tool_version,
            "0.1.0"
        );
    }

    #[test]
    fn test_supported_versions_from_cache() {
        let cache = MockCache::new().with_cached(INDEX);
        let index = index(cache.clone(), "0.2.0", false);

        let supported = index.supported_versions();
        assert_eq!(supported.to_strings(), ["2.13.16", "3.6.4"]);
        assert_eq!(supported.ceiling().unwrap().as_str(), "3.6.4");
        assert!(!supported.is_default());
        assert_eq!(cache.calls(), vec![cache.trust_window()]);
    }

    #[test]
    fn test_supported_versions_memoized() {
        let cache = MockCache::new().with_cached(INDEX);
        let index = index(cache.clone(), "0.2.0", false);

        index.supported_versions();
        index.supported_versions();
        assert_eq!(cache.calls().len(), 1);
    }

    #[test]
    fn test_stale_failure_retries_fresh() {
        let cache = MockCache::new().with_fresh(INDEX);
        let index = index(cache.clone(), "0.4.0", false);

        let supported = index.supported_versions();
        assert_eq!(supported.to_strings(), ["3.7.0"]);
        assert_eq!(cache.calls(), vec![cache.trust_window(), Duration::ZERO]);
    }

    #[test]
    fn test_malformed_cached_entry_retries_fresh() {
        let cache = MockCache::new().with_cached("{ not json").with_fresh(INDEX);
        let index = index(cache.clone(), "0.1.0", false);

        assert_eq!(
            index.supported_versions().to_strings(),
            ["2.13.15", "3.5.2"]
        );
        assert_eq!(cache.calls().len(), 2);
    }

    #[test]
    fn test_both_attempts_fail_falls_back_to_defaults() {
        let cache = MockCache::new();
        let index = index(cache.clone(), "0.2.0", false);

        let supported = index.supported_versions();
        assert!(supported.is_default());
        assert_eq!(supported, &SupportedVersions::defaults());
        assert_eq!(cache.calls(), vec![cache.trust_window(), Duration::ZERO]);
    }

    #[test]
    fn test_ci_always_fetches_fresh_once() {
        let cache = MockCache::new().with_cached(INDEX).with_fresh(INDEX);
        let index = index(cache.clone(), "0.2.0", true);

        index.supported_versions();
        assert_eq!(cache.calls(), vec![Duration::ZERO]);
    }

    #[test]
    fn test_ci_failure_falls_back_without_retry() {
        let cache = MockCache::new();
        let index = index(cache.clone(), "0.2.0", true);

        assert!(index.supported_versions().is_default());
        assert_eq!(cache.calls(), vec![Duration::ZERO]);
    }

    #[test]
    fn test_no_applicable_record_falls_back() {
        let cache = MockCache::new().with_cached(INDEX);
        let index = index(cache, "0.0.1", false);

        assert!(index.supported_versions().is_default());
    }
}
