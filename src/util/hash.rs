//! Hashing utilities for content addressing.

use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A domain-separated hasher built from several components.
///
/// Every component is followed by a NUL separator, so `("ab", "c")` and
/// `("a", "bc")` hash differently.
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Start a fingerprint in the given domain (e.g. `"blob"`, `"tree"`).
    pub fn new(domain: &str) -> Self {
        let mut fp = Fingerprint {
            hasher: Sha256::new(),
        };
        fp.update_str(domain);
        fp
    }

    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.update_bytes(s.as_bytes())
    }

    pub fn update_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.hasher.update(data);
        self.hasher.update(b"\0");
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
