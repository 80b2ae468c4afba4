//! # Content Digests
//!
//! Defines [`ContentDigest`], the SHA-256 fingerprint of a canonicalized
//! credential. The ledger anchors the `0x`-prefixed hex rendering produced by
//! [`ContentDigest::to_prefixed_hex`].
//!
//! ## Security Invariant
//!
//! [`sha256_digest`] only accepts [`CanonicalBytes`], so every fingerprint in
//! the system was produced from properly canonicalized data.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::ValidationError;

/// The hash algorithm used to compute a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

/// A content digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a SHA-256 content digest from raw bytes.
    pub fn sha256(bytes: [u8; 32]) -> Self {
        Self {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        }
    }

    /// Parse a digest from 64 hex characters, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDigest`] on wrong length or non-hex input.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        if hex.len() != 64 || !hex.is_ascii() {
            return Err(ValidationError::InvalidDigest(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| ValidationError::InvalidDigest(s.to_string()))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| ValidationError::InvalidDigest(s.to_string()))?;
        }
        Ok(Self::sha256(bytes))
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Return the digest as `0x`-prefixed lowercase hex, the form anchored on the ledger.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.algorithm, self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest::sha256(sha256_raw(data.as_bytes()))
}

/// Raw SHA-256 over arbitrary bytes.
///
/// Used only for deriving opaque identifiers (e.g. statement ids) from
/// already-validated components, never for credential fingerprints.
pub fn sha256_raw(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}
