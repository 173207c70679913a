//! Built-in fallback for the supported-versions index.
//!
//! Used only when the remote index cannot be fetched or has no record
//! applicable to the running tool version.

use crate::core::version::CompilerVersion;

/// Compiler versions this release of the tool was certified against,
/// oldest first. Must never be empty.
pub const DEFAULT_SUPPORTED_VERSIONS: &[&str] = &["2.12.20", "2.13.16", "3.3.5", "3.6.4"];

/// The built-in allow-list as compiler versions.
pub fn default_supported_versions() -> Vec<CompilerVersion> {
    DEFAULT_SUPPORTED_VERSIONS
        .iter()
        .map(|v| CompilerVersion::new(*v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_non_empty_and_sorted() {
        let versions = default_supported_versions();
        assert!(!versions.is_empty());

        let mut sorted = versions.clone();
        sorted.sort();
        assert_eq!(sorted, versions);
        assert!(versions.iter().all(|v| v.is_stable()));
    }
}
