//! Build matrix resolution.
//!
//! The end-to-end flow for one build configuration:
//!
//! ```text
//! config -> expand -> [base, variants...]
//!                        |
//!                        +-> resolve version -> normalize -> fingerprint
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::builder::cross::{expand, strip_extras};
use crate::builder::fingerprint::fingerprint;
use crate::builder::normalize::normalize;
use crate::core::config::BuildConfiguration;
use crate::resolver::resolve::{ResolvedToolchainParams, VersionResolver};
use crate::sources::cache::ArtifactCache;
use crate::util::context::GlobalContext;

/// Options for matrix resolution.
#[derive(Debug, Clone, Default)]
pub struct MatrixOptions {
    /// Number of parallel resolutions (defaults to the rayon pool size)
    pub jobs: Option<usize>,

    /// Resolve only the base configuration, not its cross variants
    pub base_only: bool,
}

/// One fully resolved build variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedVariant {
    /// Normalized configuration of the variant
    pub config: BuildConfiguration,

    /// Resolved compiler parameters; `None` for host-only units
    pub params: Option<ResolvedToolchainParams>,

    /// Build-cache key; `None` for a fully default configuration
    pub fingerprint: Option<String>,
}

impl ResolvedVariant {
    /// Short human-readable label, e.g. `3.6.4/js`.
    pub fn label(&self) -> String {
        let version = self
            .params
            .as_ref()
            .map(|p| p.compiler_version.as_str())
            .unwrap_or("host");
        format!("{}/{}", version, self.config.platform())
    }
}

/// Resolve a single configuration (no cross expansion).
pub fn resolve_variant(
    config: &BuildConfiguration,
    resolver: &VersionResolver<'_>,
) -> Result<ResolvedVariant> {
    let params = resolver.toolchain_params(config)?;

    let mut resolved = normalize(config);
    if let Some(params) = &params {
        resolved.compiler.version = Some(params.compiler_version.clone());
    }
    let fingerprint = fingerprint(&resolved);

    Ok(ResolvedVariant {
        config: resolved,
        params,
        fingerprint,
    })
}

/// Resolve the base configuration and all of its cross variants.
///
/// Variants are resolved in parallel; the result keeps expansion order with
/// the base first. The first failing variant, in that order, is reported.
pub fn resolve_matrix(
    config: &BuildConfiguration,
    resolver: &VersionResolver<'_>,
    opts: &MatrixOptions,
) -> Result<Vec<ResolvedVariant>> {
    let mut configs = vec![strip_extras(config)];
    if !opts.base_only {
        configs.extend(expand(config));
    }
    tracing::debug!("Resolving {} build variant(s)", configs.len());

    let run = || -> Vec<Result<ResolvedVariant>> {
        configs
            .par_iter()
            .map(|c| resolve_variant(c, resolver))
            .collect()
    };

    let results = match opts.jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to create resolution thread pool")?
            .install(run),
        None => run(),
    };

    results.into_iter().collect()
}

/// Resolve a build matrix with the collaborators configured in `gctx`.
pub fn resolve_matrix_with_context(
    gctx: &GlobalContext,
    config: &BuildConfiguration,
    opts: &MatrixOptions,
) -> Result<Vec<ResolvedVariant>> {
    let cache = artifact_cache_for(gctx, config);
    let index = gctx.version_index(Arc::clone(&cache))?;
    let feed = gctx.release_feed(cache)?;
    let resolver = VersionResolver::new(&index, &feed, &feed);

    resolve_matrix(config, &resolver, opts)
}

/// The context's artifact cache, with the configuration's trust window
/// override applied.
pub fn artifact_cache_for(
    gctx: &GlobalContext,
    config: &BuildConfiguration,
) -> Arc<dyn ArtifactCache> {
    let cache = gctx.artifact_cache();
    match config.internal.cache_ttl_secs {
        Some(secs) => Arc::from(cache.with_trust_window(Duration::from_secs(secs))),
        None => cache,
    }
}
