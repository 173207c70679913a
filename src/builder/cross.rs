//! Cross-build matrix expansion.
//!
//! A configuration with extra compiler versions and extra platforms stands
//! for a matrix of builds:
//!
//! ```text
//! versions  = base, then extras newest first
//! platforms = base, then extras in declaration order
//! variants  = versions x platforms, minus (base, base)
//! ```
//!
//! The base configuration itself is built by the caller and is never part
//! of the expansion.

use crate::core::backend::Backend;
use crate::core::config::BuildConfiguration;
use crate::core::version::CompilerVersion;

/// The compiler versions of the matrix: base first, then extras newest first.
///
/// An extra equal to the base version is dropped.
pub fn matrix_versions(base: &BuildConfiguration) -> Vec<Option<String>> {
    let base_version = base.compiler.version.clone();

    let mut extras: Vec<CompilerVersion> = base
        .compiler
        .extra_versions
        .iter()
        .filter(|v| base_version.as_deref() != Some(v.as_str()))
        .map(|v| CompilerVersion::new(v.as_str()))
        .collect();
    extras.sort_by(|a, b| b.cmp(a));
    extras.dedup();

    let mut versions = vec![base_version];
    versions.extend(extras.into_iter().map(|v| Some(v.to_string())));
    versions
}

/// The platforms of the matrix: base first, then extras in declaration order.
pub fn matrix_platforms(base: &BuildConfiguration) -> Vec<Backend> {
    let mut platforms = vec![base.platform()];
    for platform in &base.extra_platforms {
        if !platforms.contains(platform) {
            platforms.push(*platform);
        }
    }
    platforms
}

/// Expand a configuration into its additional cross-build variants.
///
/// Each variant pins one (version, platform) pair and has its extra sets
/// cleared, so expanding a variant again yields nothing.
///
/// The result is the full product minus the base pair. Two extra versions
/// and one extra platform therefore give 2 variants only when that platform
/// is the base platform, and 5 when it is a new one.
pub fn expand(base: &BuildConfiguration) -> Vec<BuildConfiguration> {
    let versions = matrix_versions(base);
    let platforms = matrix_platforms(base);

    let mut variants = Vec::with_capacity(versions.len() * platforms.len());
    for (vi, version) in versions.iter().enumerate() {
        for (pi, platform) in platforms.iter().enumerate() {
            if vi == 0 && pi == 0 {
                continue;
            }
            variants.push(pin(base, version.clone(), *platform));
        }
    }

    tracing::debug!(
        "Expanded configuration into {} cross-build variant(s)",
        variants.len()
    );
    variants
}

/// The base configuration with its extra sets cleared.
pub fn strip_extras(base: &BuildConfiguration) -> BuildConfiguration {
    pin(base, base.compiler.version.clone(), base.platform())
}

fn pin(base: &BuildConfiguration, version: Option<String>, platform: Backend) -> BuildConfiguration {
    let mut config = base.clone();
    config.compiler.version = version;
    config.compiler.extra_versions.clear();
    config.platform = Some(platform);
    config.extra_platforms.clear();
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(version: &str, extras: &[&str], platforms: &[Backend]) -> BuildConfiguration {
        let mut config = BuildConfiguration::default();
        config.compiler.version = Some(version.to_string());
        config.compiler.extra_versions = extras.iter().map(|v| v.to_string()).collect();
        config.extra_platforms = platforms.to_vec();
        config
    }

    fn pairs(variants: &[BuildConfiguration]) -> Vec<(String, Backend)> {
        variants
            .iter()
            .map(|c| (c.compiler.version.clone().unwrap_or_default(), c.platform()))
            .collect()
    }

    #[test]
    fn test_no_extras_expands_to_nothing() {
        let config = base("3.6.4", &[], &[]);
        assert!(expand(&config).is_empty());
    }

    #[test]
    fn test_extra_versions_with_base_platform_repeated() {
        // The extra platform is the base platform, so only the version axis grows.
        let config = base("3.6.4", &["2.12.20", "2.13.16"], &[Backend::Jvm]);
        let variants = expand(&config);

        assert_eq!(
            pairs(&variants),
            vec![
                ("2.13.16".to_string(), Backend::Jvm),
                ("2.12.20".to_string(), Backend::Jvm),
            ]
        );
    }

    #[test]
    fn test_full_matrix() {
        let config = base("3.6.4", &["2.12.20", "2.13.16"], &[Backend::Js]);
        let variants = expand(&config);

        assert_eq!(
            pairs(&variants),
            vec![
                ("3.6.4".to_string(), Backend::Js),
                ("2.13.16".to_string(), Backend::Jvm),
                ("2.13.16".to_string(), Backend::Js),
                ("2.12.20".to_string(), Backend::Jvm),
                ("2.12.20".to_string(), Backend::Js),
            ]
        );
    }

    #[test]
    fn test_versions_sorted_numerically_descending() {
        let config = base("3.6.4", &["2.9.3", "2.13.16", "2.10.7"], &[]);
        let versions: Vec<_> = pairs(&expand(&config)).into_iter().map(|(v, _)| v).collect();
        assert_eq!(versions, ["2.13.16", "2.10.7", "2.9.3"]);
    }

    #[test]
    fn test_variants_have_extras_cleared() {
        let config = base("3.6.4", &["2.13.16"], &[Backend::Native]);
        for variant in expand(&config) {
            assert!(variant.compiler.extra_versions.is_empty());
            assert!(variant.extra_platforms.is_empty());
            assert!(expand(&variant).is_empty());
        }
    }

    #[test]
    fn test_variants_keep_other_fields() {
        let mut config = base("3.6.4", &["2.13.16"], &[]);
        config.compiler.options = vec!["-deprecation".to_string()];
        config.native.gc = Some("immix".to_string());

        let variants = expand(&config);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].compiler.options, ["-deprecation"]);
        assert_eq!(variants[0].native.gc.as_deref(), Some("immix"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let config = base(
            "3.6.4",
            &["3.6.4", "2.13.16"],
            &[Backend::Js, Backend::Js, Backend::Jvm],
        );
        let variants = expand(&config);
        // 2 versions x 2 platforms, minus the base.
        assert_eq!(variants.len(), 3);
    }

    #[test]
    fn test_expand_does_not_touch_base() {
        let config = base("3.6.4", &["2.13.16"], &[Backend::Js]);
        let before = config.clone();
        let _ = expand(&config);
        assert_eq!(config, before);
    }

    #[test]
    fn test_strip_extras() {
        let config = base("3.6.4", &["2.13.16"], &[Backend::Js]);
        let stripped = strip_extras(&config);
        assert_eq!(stripped.compiler.version.as_deref(), Some("3.6.4"));
        assert!(stripped.compiler.extra_versions.is_empty());
        assert!(stripped.extra_platforms.is_empty());
    }
}
