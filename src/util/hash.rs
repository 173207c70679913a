//! Hashing utilities for cache keys and fingerprints.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    sha256_bytes(s.as_bytes())
}

/// A hasher for building fingerprints from named components.
///
/// Each component is fed as `<name>=<value>\n`, so two components can never
/// run together into the same byte stream.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha1,
    components: usize,
}

impl Fingerprint {
    /// Create a new fingerprint builder.
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha1::new(),
            components: 0,
        }
    }

    /// Add a named component.
    pub fn update_field(&mut self, name: &str, value: &str) -> &mut Self {
        self.hasher.update(name.as_bytes());
        self.hasher.update(b"=");
        self.hasher.update(value.as_bytes());
        self.hasher.update(b"\n");
        self.components += 1;
        self
    }

    /// Number of components added so far.
    pub fn len(&self) -> usize {
        self.components
    }

    /// Whether no component has been added.
    pub fn is_empty(&self) -> bool {
        self.components == 0
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    /// Finalize and return a short fingerprint (first `len` hex chars).
    pub fn finish_short(self, len: usize) -> String {
        let mut digest = self.finish();
        digest.truncate(len);
        digest
    }
}
