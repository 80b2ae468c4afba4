//! # Cryptographic Error Types
//!
//! Structured errors for signing, verification, and key loading.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Invalid Ed25519 signature length.
    #[error("invalid Ed25519 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Invalid Ed25519 public key.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Signing key material is malformed.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// A required key source is not configured.
    #[error("key source unavailable: {0}")]
    KeyUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signature_length_display() {
        let err = CryptoError::InvalidSignatureLength(32);
        let msg = format!("{err}");
        assert!(msg.contains("64 bytes"));
        assert!(msg.contains("32"));
    }

    #[test]
    fn key_unavailable_names_source() {
        let err = CryptoError::KeyUnavailable("ISSUER_SEED_HEX not set".into());
        assert!(err.to_string().contains("ISSUER_SEED_HEX"));
    }
}
