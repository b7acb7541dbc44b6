//! # Content Digests
//!
//! SHA-256 digests over reference data, so a calculation result can name
//! the exact reference version it was computed against.
//!
//! ## Canonical form
//!
//! [`ContentDigest::of_json`] first converts the value into a
//! `serde_json::Value`, whose object maps are key-sorted, then hashes the
//! compact serialization. Two snapshots with equal content therefore digest
//! identically regardless of field or insertion order in their source files.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A SHA-256 content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn sha256(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Digest the canonical JSON form of `value`.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `value` cannot be represented as
    /// JSON (e.g. a map with non-string keys).
    pub fn of_json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let canonical = serde_json::to_value(value)?;
        let bytes = serde_json::to_vec(&canonical)?;
        Ok(Self::sha256(Sha256::digest(&bytes).into()))
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// SHA-256 of raw bytes as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    ContentDigest::sha256(Sha256::digest(data).into()).to_hex()
}
