//! Build matrix construction.
//!
//! This module turns one build configuration into the set of variants to
//! build, and derives a cache key for each of them.

pub mod cross;
pub mod fingerprint;
pub mod normalize;

pub use cross::expand;
pub use fingerprint::{fingerprint, FINGERPRINT_LEN};
pub use normalize::normalize;
