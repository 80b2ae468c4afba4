//! # Error Hierarchy
//!
//! Structured errors for the foundational types, built with `thiserror`.
//! Each variant carries the offending input so operators can diagnose
//! misconfiguration without guesswork.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for identifier newtypes and digests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// DID does not conform to W3C DID syntax (did:method:identifier).
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// A ledger URI does not carry the expected prefix or is missing its body.
    #[error("invalid {kind} identifier: \"{value}\" (expected {prefix}<network>:<id>)")]
    InvalidIdentifier {
        /// Human-readable identifier kind ("space", "schema", ...).
        kind: &'static str,
        /// The expected URI prefix.
        prefix: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Digest is not 32 bytes of hex.
    #[error("invalid digest: \"{0}\" (expected 64 hex characters, optional 0x prefix)")]
    InvalidDigest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failure_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CanonicalizationError::from(source);
        assert!(err.to_string().starts_with("serialization failed"));
    }

    #[test]
    fn invalid_identifier_display_names_prefix() {
        let err = ValidationError::InvalidIdentifier {
            kind: "schema",
            prefix: "schema:",
            value: "bogus".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("schema"));
        assert!(msg.contains("bogus"));
    }
}
