//! Compilation backends.
//!
//! A build configuration targets exactly one backend at a time. Options for
//! the other backends may still be present in the configuration but are
//! irrelevant to the build and are cleared by the normalizer.

use serde::{Deserialize, Serialize};

/// A compilation backend (the platform the compiler emits code for).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Managed-runtime bytecode (default)
    #[default]
    Jvm,
    /// JavaScript output
    #[serde(alias = "javascript")]
    Js,
    /// Native code through LLVM
    Native,
}

impl Backend {
    /// All backends, in declaration order.
    pub const ALL: [Backend; 3] = [Backend::Jvm, Backend::Js, Backend::Native];

    /// Get the backend name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Jvm => "jvm",
            Backend::Js => "js",
            Backend::Native => "native",
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = BackendParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jvm" => Ok(Backend::Jvm),
            "js" | "javascript" => Ok(Backend::Js),
            "native" => Ok(Backend::Native),
            _ => Err(BackendParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an invalid backend name.
#[derive(Debug, Clone)]
pub struct BackendParseError(pub String);

impl std::fmt::Display for BackendParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid backend '{}', valid values: jvm, js, native",
            self.0
        )
    }
}

impl std::error::Error for BackendParseError {}
