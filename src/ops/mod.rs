//! High-level operations.
//!
//! This module contains the implementation of crossbuild commands.

pub mod matrix;

pub use matrix::{
    resolve_matrix, resolve_matrix_with_context, resolve_variant, MatrixOptions, ResolvedVariant,
};
