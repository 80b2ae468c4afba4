//! # Canonical Serialization
//!
//! Defines [`CanonicalBytes`], the sole construction path for bytes that are
//! fingerprinted or signed anywhere in the workspace.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct `CanonicalBytes`
//! is through [`CanonicalBytes::new()`], which serializes through `serde_jcs`.
//! Two semantically equal credential payloads
//! therefore always produce the same credential hash, regardless of the key
//! order the client happened to send.
//!
//! ## Encoding
//!
//! Output is RFC 8785 (JSON Canonicalization Scheme): keys sorted by UTF-16
//! code units with no whitespace, numbers rendered the ECMAScript way. Values
//! are otherwise hashed as sent, so sub-second timestamps and fractional
//! numbers stay part of the fingerprint.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonicalization.
///
/// The inner `Vec<u8>` is private: downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::SerializationFailed`] if serde cannot
    /// represent the value as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Ok(Self(serde_jcs::to_vec(&value)?))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Number of canonical bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical encoding is empty (never true for valid JSON).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
