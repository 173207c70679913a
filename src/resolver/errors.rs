//! Resolution error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error resolving a compiler version.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ResolveError {
    /// The requested version does not exist in the relevant feed.
    #[error("unsupported compiler version `{version}`")]
    #[diagnostic(
        code(crossbuild::resolve::unsupported_version),
        help("pick one of the supported compiler versions")
    )]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// A feed needed to answer the request could not be read.
    #[error("could not look up compiler version `{version}`: {message}")]
    #[diagnostic(code(crossbuild::resolve::index_fetch))]
    IndexFetch {
        version: String,
        message: String,
        /// The feed was only missing from the cache in offline mode
        offline: bool,
    },
}

impl ResolveError {
    /// The version string the error is about.
    pub fn version(&self) -> &str {
        match self {
            ResolveError::UnsupportedVersion { version, .. }
            | ResolveError::IndexFetch { version, .. } => version,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnsupportedVersion { version, supported } => {
                let mut diag =
                    Diagnostic::error(format!("unsupported compiler version `{}`", version));

                if !supported.is_empty() {
                    diag = diag.with_context(format!(
                        "supported versions: {}",
                        supported.join(", ")
                    ));
                }

                diag.with_suggestion(format!(
                    "Set `compiler.version` to one of the supported versions instead of `{}`",
                    version
                ))
                .with_suggestion("Use `3.nightly` to follow the latest nightly build")
            }

            ResolveError::IndexFetch {
                version,
                message,
                offline,
            } => Diagnostic::error(format!("could not look up compiler version `{}`", version))
                .with_context(message.clone())
                .with_suggestion(if *offline {
                    suggestions::OFFLINE
                } else {
                    suggestions::FETCH_FAILED
                }),
        }
    }
}
