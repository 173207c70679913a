//! Classification of compiler version requests.
//!
//! Classification is pure string matching and never fails: anything that is
//! not recognized as a nightly request or a pre-release is treated as an
//! explicit stable version and validated later by the resolver.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::version::ReleaseLine;

/// Major line targeted by the bare `nightly` alias.
pub const PRIMARY_MAJOR_LINE: u64 = 3;

/// Exact nightly aliases and the line each one follows.
const NIGHTLY_ALIASES: &[(&str, u64)] = &[
    ("nightly", PRIMARY_MAJOR_LINE),
    ("3.nightly", 3),
    ("2.nightly", 2),
];

/// `<major>.<minor>.nightly`
static MINOR_NIGHTLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.nightly$").expect("valid regex"));

/// Nightly build identifiers per major line, newest line first.
static NIGHTLY_IDENTIFIERS: LazyLock<Vec<(u64, Regex)>> = LazyLock::new(|| {
    vec![
        (
            3,
            Regex::new(r"^3\.\d+\.\d+(?:-RC\d+)?(?:-bin-\d{8}-[0-9a-f]+)?-NIGHTLY$")
                .expect("valid regex"),
        ),
        (
            2,
            Regex::new(r"^2\.\d+\.\d+-bin-[0-9a-f]{7,}$").expect("valid regex"),
        ),
    ]
});

/// What kind of version a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No version requested; the resolver picks a default.
    Unspecified,
    /// A final release such as `2.13.16`.
    ExplicitStable,
    /// A nightly alias such as `3.nightly`: latest nightly of a major line.
    NightlyAlias(ReleaseLine),
    /// `<major>.<minor>.nightly`: latest nightly of a minor line.
    NightlyPattern(ReleaseLine),
    /// A concrete nightly build identifier of the given major line.
    GenericNightly(ReleaseLine),
    /// A pre-release: RC, milestone, or anything else containing letters.
    NonStable,
}

impl Classification {
    /// Whether resolving this request needs the nightly feed.
    pub fn is_nightly(&self) -> bool {
        matches!(
            self,
            Classification::NightlyAlias(_)
                | Classification::NightlyPattern(_)
                | Classification::GenericNightly(_)
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Unspecified => write!(f, "unspecified"),
            Classification::ExplicitStable => write!(f, "stable"),
            Classification::NightlyAlias(line) => write!(f, "nightly alias ({})", line),
            Classification::NightlyPattern(line) => write!(f, "nightly pattern ({})", line),
            Classification::GenericNightly(line) => write!(f, "nightly build ({})", line),
            Classification::NonStable => write!(f, "pre-release"),
        }
    }
}

/// Classify a version request.
pub fn classify(request: Option<&str>) -> Classification {
    let request = match request.map(str::trim) {
        None | Some("") => return Classification::Unspecified,
        Some(request) => request,
    };

    if let Some((_, major)) = NIGHTLY_ALIASES.iter().find(|(alias, _)| *alias == request) {
        return Classification::NightlyAlias(ReleaseLine::major(*major));
    }

    if let Some(caps) = MINOR_NIGHTLY.captures(request) {
        // Components that overflow u64 fall through to the later rules.
        if let (Ok(major), Ok(minor)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) {
            return Classification::NightlyPattern(ReleaseLine::minor(major, minor));
        }
    }

    for (major, pattern) in NIGHTLY_IDENTIFIERS.iter() {
        if pattern.is_match(request) {
            return Classification::GenericNightly(ReleaseLine::major(*major));
        }
    }

    if request.chars().any(|c| c.is_alphabetic()) {
        return Classification::NonStable;
    }

    Classification::ExplicitStable
}
