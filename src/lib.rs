//! crossbuild - compiler version resolution for cross-built projects
//!
//! This crate provides the core library functionality for crossbuild:
//! classifying and resolving compiler version requests, expanding a build
//! configuration into its cross-build matrix, and fingerprinting each
//! variant for build caches.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for crossbuild unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations of the artifact cache
/// and the release feeds.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Backend, BuildConfiguration, CompilerVersion};

pub use resolver::{classify, Classification, ResolveError, VersionResolver};
pub use util::context::GlobalContext;
