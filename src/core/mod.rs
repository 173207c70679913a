//! Core data structures for crossbuild.
//!
//! This module contains the foundational types used throughout crossbuild:
//! - Compilation backends
//! - The build configuration tree and its structural merge
//! - Compiler and tool version ordering

pub mod backend;
pub mod config;
pub mod version;

pub use backend::Backend;
pub use config::{load_build_configuration, BuildConfiguration, CONFIG_FILE_NAME};
pub use version::{CompilerVersion, ReleaseLine};
