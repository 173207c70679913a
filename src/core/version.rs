//! Compiler and tool version handling.
//!
//! Compiler versions come from user input and remote feeds, so they are kept
//! as raw strings and only parsed for ordering. Parsing is lenient: `3`,
//! `3.4` and `3.4.0` are all accepted, and any pre-release tail such as
//! `-RC1` or `-bin-20250101-abc1234-NIGHTLY` is ordered per semver.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Commit-distance marker appended by describe-style version strings,
/// e.g. `1.5.0-12-g3fa9c21`.
static COMMIT_DISTANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+)-g[0-9a-fA-F]+$").expect("valid regex"));

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// A compiler version string with a total, deterministic ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerVersion {
    raw: String,
}

impl CompilerVersion {
    /// Wrap a raw version string.
    pub fn new(raw: impl Into<String>) -> Self {
        CompilerVersion { raw: raw.into() }
    }

    /// The version exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed form, if the string is a recognizable version.
    pub fn parsed(&self) -> Option<Version> {
        parse_version_lenient(&self.raw)
    }

    /// Whether this is a final release (digits and dots only).
    pub fn is_stable(&self) -> bool {
        is_stable(&self.raw)
    }

    /// The binary compatibility version for artifacts built by this compiler.
    pub fn binary_version(&self) -> String {
        binary_version(&self.raw)
    }
}

impl From<&str> for CompilerVersion {
    fn from(s: &str) -> Self {
        CompilerVersion::new(s)
    }
}

impl From<String> for CompilerVersion {
    fn from(s: String) -> Self {
        CompilerVersion::new(s)
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for CompilerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Unparseable strings sort below every real version.
        let ord = match (self.parsed(), other.parsed()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        ord.then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for CompilerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A release line: a major version, optionally narrowed to one minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleaseLine {
    pub major: u64,
    pub minor: Option<u64>,
}

impl ReleaseLine {
    /// A whole major line, e.g. `3`.
    pub fn major(major: u64) -> Self {
        ReleaseLine { major, minor: None }
    }

    /// A single minor line, e.g. `3.4`.
    pub fn minor(major: u64, minor: u64) -> Self {
        ReleaseLine {
            major,
            minor: Some(minor),
        }
    }

    /// Check whether a version belongs to this line.
    pub fn contains(&self, version: &CompilerVersion) -> bool {
        match version.parsed() {
            Some(v) => v.major == self.major && self.minor.map_or(true, |m| v.minor == m),
            None => false,
        }
    }
}

impl fmt::Display for ReleaseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

/// Parse a version string, allowing for incomplete versions.
///
/// Missing minor/patch components are zero. A pre-release tail after the
/// first `-` is kept.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    // Try exact parse first
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let (core, tail) = match s.split_once('-') {
        Some((core, tail)) => (core, Some(tail)),
        None => (s, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut nums = [0u64; 3];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }

    match tail {
        Some(tail) => format!("{}.{}.{}-{}", nums[0], nums[1], nums[2], tail)
            .parse()
            .ok(),
        None => Some(Version::new(nums[0], nums[1], nums[2])),
    }
}

/// A stable version contains only digits and dots.
pub fn is_stable(version: &str) -> bool {
    !version.is_empty() && version.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Compute the binary compatibility version of a compiler version.
///
/// From major line 3 onwards binaries are compatible across a major line;
/// earlier lines are compatible within a minor line.
pub fn binary_version(version: &str) -> String {
    match parse_version_lenient(version) {
        Some(v) if v.major >= 3 => v.major.to_string(),
        Some(v) => format!("{}.{}", v.major, v.minor),
        None => version.to_string(),
    }
}

/// Compute the version a running tool should be treated as when looking up
/// its supported-versions record.
///
/// - A trailing `-SNAPSHOT` is stripped.
/// - A commit-distance marker (`-<n>-g<hash>`) is stripped and the patch
///   component is incremented once, since such builds come after the
///   tagged release.
/// - Short versions are zero-padded; components past the third are ignored.
///
/// Returns `None` when the remaining core is not numeric.
pub fn adjusted_tool_version(raw: &str) -> Option<Version> {
    let mut rest = raw.trim();
    if let Some(stripped) = rest.strip_suffix(SNAPSHOT_SUFFIX) {
        rest = stripped;
    }

    let mut bump = false;
    if let Some(m) = COMMIT_DISTANCE.find(rest) {
        rest = &rest[..m.start()];
        bump = true;
    }

    let core = rest.split(['-', '+']).next().unwrap_or(rest);
    let mut nums = [0u64; 3];
    let mut seen = 0;
    for (slot, part) in nums.iter_mut().zip(core.split('.')) {
        *slot = part.parse().ok()?;
        seen += 1;
    }
    if seen == 0 {
        return None;
    }

    if bump {
        nums[2] = nums[2].saturating_add(1);
    }

    Some(Version::new(nums[0], nums[1], nums[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version_lenient("3"), Some(Version::new(3, 0, 0)));
        assert_eq!(parse_version_lenient("2.13"), Some(Version::new(2, 13, 0)));
        assert_eq!(
            parse_version_lenient("2.13.8"),
            Some(Version::new(2, 13, 8))
        );
        let nightly = parse_version_lenient("3.4.0-RC1-bin-20230101-abc1234-NIGHTLY").unwrap();
        assert_eq!((nightly.major, nightly.minor, nightly.patch), (3, 4, 0));
        assert!(!nightly.pre.is_empty());
        assert_eq!(parse_version_lenient("3.nightly"), None);
        assert_eq!(parse_version_lenient("1.2.3.4"), None);
    }

    #[test]
    fn test_compiler_version_ordering() {
        let mut versions: Vec<CompilerVersion> = ["3.4.0", "2.13.8", "3.4.0-RC1", "3.10.1", "bogus"]
            .into_iter()
            .map(CompilerVersion::from)
            .collect();
        versions.sort();

        let sorted: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(sorted, ["bogus", "2.13.8", "3.4.0-RC1", "3.4.0", "3.10.1"]);
    }

    #[test]
    fn test_ordering_consistent_with_eq() {
        let a = CompilerVersion::from("3.4");
        let b = CompilerVersion::from("3.4.0");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_is_stable() {
        assert!(is_stable("2.13.8"));
        assert!(is_stable("3"));
        assert!(!is_stable("3.4.0-RC1"));
        assert!(!is_stable("3.4.0-NIGHTLY"));
        assert!(!is_stable(""));
    }

    #[test]
    fn test_binary_version() {
        assert_eq!(binary_version("2.13.8"), "2.13");
        assert_eq!(binary_version("2.12.20"), "2.12");
        assert_eq!(binary_version("3.6.4"), "3");
        assert_eq!(binary_version("3.4.0-NIGHTLY"), "3");
        assert_eq!(binary_version("weird"), "weird");
    }

    #[test]
    fn test_release_line_contains() {
        let three = ReleaseLine::major(3);
        let three_four = ReleaseLine::minor(3, 4);

        assert!(three.contains(&"3.4.0-NIGHTLY".into()));
        assert!(three.contains(&"3.5.1".into()));
        assert!(three_four.contains(&"3.4.2".into()));
        assert!(!three_four.contains(&"3.5.1".into()));
        assert!(!three.contains(&"2.13.8".into()));
        assert_eq!(three_four.to_string(), "3.4");
    }

    #[test]
    fn test_adjusted_tool_version_plain() {
        assert_eq!(adjusted_tool_version("1.5.0"), Some(Version::new(1, 5, 0)));
        assert_eq!(adjusted_tool_version("1.5"), Some(Version::new(1, 5, 0)));
        assert_eq!(adjusted_tool_version("1.5.0.7"), Some(Version::new(1, 5, 0)));
    }

    #[test]
    fn test_adjusted_tool_version_snapshot_only() {
        assert_eq!(
            adjusted_tool_version("1.5.0-SNAPSHOT"),
            Some(Version::new(1, 5, 0))
        );
    }

    #[test]
    fn test_adjusted_tool_version_commit_distance() {
        assert_eq!(
            adjusted_tool_version("1.5.0-12-g3fa9c21"),
            Some(Version::new(1, 5, 1))
        );
    }

    #[test]
    fn test_adjusted_tool_version_both_markers_bump_once() {
        assert_eq!(
            adjusted_tool_version("1.5.9-3-gdeadbee-SNAPSHOT"),
            Some(Version::new(1, 5, 10))
        );
    }

    #[test]
    fn test_adjusted_tool_version_patch_saturates() {
        let raw = format!("1.5.{}-1-gabc", u64::MAX);
        assert_eq!(
            adjusted_tool_version(&raw),
            Some(Version::new(1, 5, u64::MAX))
        );
    }

    #[test]
    fn test_adjusted_tool_version_unparseable() {
        assert_eq!(adjusted_tool_version("dev"), None);
        assert_eq!(adjusted_tool_version(""), None);
    }
}
