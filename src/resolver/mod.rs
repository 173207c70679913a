//! Compiler version resolution.
//!
//! A version request is first classified by pure string matching, then
//! resolved against the supported-versions allow-list and the release
//! feeds. All I/O goes through the collaborator traits in `sources`.

pub mod classify;
pub mod errors;
pub mod resolve;

pub use classify::{classify, Classification};
pub use errors::ResolveError;
pub use resolve::{
    ResolvedToolchainParams, ResolvedVersion, SupportedVersionsSource, VersionResolver,
};
