//! Resolution of a version request to a concrete compiler version.
//!
//! | classification        | source of truth                   | on miss              |
//! |-----------------------|-----------------------------------|----------------------|
//! | unspecified           | stable releases, bounded by the allow-list ceiling | -   |
//! | nightly alias/pattern | latest nightly of the line        | unsupported version  |
//! | nightly build         | nightly feed contains it          | unsupported version  |
//! | pre-release           | non-stable feed contains it       | unsupported version  |
//! | stable                | stable feed contains it           | unsupported version  |
//!
//! Feed outages are errors. Only the allow-list has a built-in fallback.

use serde::{Deserialize, Serialize};

use crate::core::config::BuildConfiguration;
use crate::core::version::CompilerVersion;
use crate::resolver::classify::{classify, Classification};
use crate::resolver::errors::ResolveError;
use crate::sources::cache::FetchError;
use crate::sources::feed::{FeedError, NightlyFeedResolver, StableFeedResolver};
use crate::sources::index::{RemoteVersionIndex, SupportedVersions};

/// Anything that can provide the allow-list of supported versions.
pub trait SupportedVersionsSource: Send + Sync {
    /// The allow-list. Never empty.
    fn supported_versions(&self) -> &SupportedVersions;
}

impl SupportedVersionsSource for RemoteVersionIndex {
    fn supported_versions(&self) -> &SupportedVersions {
        RemoteVersionIndex::supported_versions(self)
    }
}

impl SupportedVersionsSource for SupportedVersions {
    fn supported_versions(&self) -> &SupportedVersions {
        self
    }
}

/// A concrete compiler version chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The compiler version
    pub version: String,

    /// How the request was classified
    pub classification: Classification,

    /// An explicit stable version newer than anything on the allow-list
    pub exceeds_ceiling: bool,
}

/// Compiler parameters for one (configuration, backend) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedToolchainParams {
    /// Concrete compiler version
    pub compiler_version: String,

    /// Binary compatibility version of produced artifacts
    pub binary_version: String,

    /// Backend-specific artifact suffix, if any
    pub platform_suffix: Option<String>,
}

/// Resolves version requests against the allow-list and release feeds.
pub struct VersionResolver<'a> {
    supported: &'a dyn SupportedVersionsSource,
    nightly: &'a dyn NightlyFeedResolver,
    stable: &'a dyn StableFeedResolver,
}

impl<'a> VersionResolver<'a> {
    /// Create a resolver over the given collaborators.
    pub fn new(
        supported: &'a dyn SupportedVersionsSource,
        nightly: &'a dyn NightlyFeedResolver,
        stable: &'a dyn StableFeedResolver,
    ) -> Self {
        VersionResolver {
            supported,
            nightly,
            stable,
        }
    }

    /// Resolve a raw version request.
    ///
    /// Returns `Ok(None)` only for an unspecified request on a unit without
    /// compiler sources (`host_only`).
    pub fn resolve(
        &self,
        request: Option<&str>,
        host_only: bool,
    ) -> Result<Option<ResolvedVersion>, ResolveError> {
        let classification = classify(request);
        let request = request.map(str::trim).unwrap_or_default();
        self.resolve_classified(request, classification, host_only)
    }

    /// Resolve a request that has already been classified.
    pub fn resolve_classified(
        &self,
        request: &str,
        classification: Classification,
        host_only: bool,
    ) -> Result<Option<ResolvedVersion>, ResolveError> {
        let resolved = |version: String, exceeds_ceiling: bool| {
            Some(ResolvedVersion {
                version,
                classification,
                exceeds_ceiling,
            })
        };

        match classification {
            Classification::Unspecified => {
                if host_only {
                    tracing::debug!("No compiler version requested for a host-only unit");
                    return Ok(None);
                }
                let version = self.default_version()?;
                tracing::debug!("Using default compiler version {}", version);
                Ok(resolved(version, false))
            }

            Classification::NightlyAlias(line) | Classification::NightlyPattern(line) => {
                let version = self
                    .nightly
                    .latest_nightly(&line)
                    .map_err(|e| self.feed_error(request, e))?;
                tracing::debug!("Resolved {} to nightly {}", request, version);
                Ok(resolved(version, false))
            }

            Classification::GenericNightly(_) | Classification::NonStable => {
                self.nightly
                    .check_nightly_exists(request)
                    .map_err(|e| self.feed_error(request, e))?;
                Ok(resolved(request.to_string(), false))
            }

            Classification::ExplicitStable => {
                self.stable
                    .validate_stable_exists(request)
                    .map_err(|e| self.feed_error(request, e))?;

                let supported = self.supported.supported_versions();
                let exceeds_ceiling = supported
                    .ceiling()
                    .is_some_and(|ceiling| CompilerVersion::new(request) > *ceiling);
                if exceeds_ceiling {
                    tracing::warn!(
                        "Compiler version {} is newer than the latest supported version {}; it may not work",
                        request,
                        supported.ceiling().map(|c| c.as_str()).unwrap_or_default()
                    );
                } else if !supported.contains(request) {
                    tracing::debug!("Compiler version {} is not on the supported list", request);
                }

                Ok(resolved(request.to_string(), exceeds_ceiling))
            }
        }
    }

    /// Resolve the compiler parameters of a configuration.
    pub fn toolchain_params(
        &self,
        config: &BuildConfiguration,
    ) -> Result<Option<ResolvedToolchainParams>, ResolveError> {
        let resolved = self.resolve(
            config.compiler.version.as_deref(),
            config.compiler.is_host_only(),
        )?;

        Ok(resolved.map(|resolved| {
            let binary_version = config
                .compiler
                .binary_version
                .clone()
                .unwrap_or_else(|| CompilerVersion::new(resolved.version.as_str()).binary_version());

            ResolvedToolchainParams {
                compiler_version: resolved.version,
                binary_version,
                platform_suffix: config.platform_suffix(),
            }
        }))
    }

    /// Pick the newest stable release that does not exceed the allow-list
    /// ceiling and stays on the ceiling's major line.
    fn default_version(&self) -> Result<String, ResolveError> {
        let stable = self
            .stable
            .all_stable_versions()
            .map_err(|e| self.feed_error("default", e))?;

        let supported = self.supported.supported_versions();
        let fallback = SupportedVersions::defaults();
        let ceiling = match supported.ceiling().or(fallback.ceiling()) {
            Some(ceiling) => ceiling.clone(),
            None => {
                return Err(ResolveError::UnsupportedVersion {
                    version: "default".to_string(),
                    supported: Vec::new(),
                })
            }
        };
        let ceiling_major = ceiling.parsed().map(|v| v.major);

        let chosen = stable
            .iter()
            .map(|v| CompilerVersion::new(v.as_str()))
            .filter(|v| v.is_stable())
            .filter(|v| *v <= ceiling)
            .filter(|v| v.parsed().map(|p| p.major) == ceiling_major)
            .max();

        Ok(chosen.unwrap_or(ceiling).to_string())
    }

    fn feed_error(&self, request: &str, err: FeedError) -> ResolveError {
        match err {
            FeedError::NotFound(_) => ResolveError::UnsupportedVersion {
                version: request.to_string(),
                supported: self.supported.supported_versions().to_strings(),
            },
            FeedError::Fetch(e) => ResolveError::IndexFetch {
                version: request.to_string(),
                message: e.to_string(),
                offline: matches!(e, FetchError::Offline { .. }),
            },
            FeedError::Malformed { .. } => ResolveError::IndexFetch {
                version: request.to_string(),
                message: err.to_string(),
                offline: false,
            },
        }
    }
}
