//! # Key Provider Abstraction
//!
//! Abstracts Ed25519 key storage and signing behind a trait so the
//! lifecycle manager holds authorities, not keys:
//!
//! - [`LocalKeyProvider`]: in-memory key for development and testing.
//! - [`EnvKeyProvider`]: loads a hex-encoded 32-byte seed from an
//!   environment variable, as injected by container secret managers.
//!
//! ## Security Invariants
//!
//! - Key material is zeroized on drop, including the hex string read from
//!   the environment.
//! - `KeyProvider` is `Send + Sync` for use across async tasks.
//! - Signing input is `&CanonicalBytes` (never raw bytes).

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use vd_core::CanonicalBytes;

use crate::ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
use crate::error::CryptoError;

/// Signature scheme of a provider's key, as reported to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Ed25519 (the only scheme the ledger adapter submits).
    Ed25519,
}

/// A signature tagged with the scheme that produced it.
///
/// This is the shape the ledger expects alongside every signed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    /// Hex-encoded signature.
    pub signature: Ed25519Signature,
    /// Scheme of the signing key.
    pub key_type: KeyType,
}

/// Trait for Ed25519 key storage and signing backends.
pub trait KeyProvider: Send + Sync {
    /// Sign canonicalized data with the managed key.
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError>;

    /// Return the verifying (public) key.
    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError>;

    /// Human-readable name for this provider (for diagnostics/logging).
    fn provider_name(&self) -> &str;

    /// Scheme of the managed key.
    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    /// Sign and tag the result with the key scheme.
    fn sign_response(&self, data: &CanonicalBytes) -> Result<SignResponse, CryptoError> {
        Ok(SignResponse {
            signature: self.sign(data)?,
            key_type: self.key_type(),
        })
    }
}

// ─── LocalKeyProvider ────────────────────────────────────────────────────

/// In-memory Ed25519 key provider for development and testing.
pub struct LocalKeyProvider {
    key: SigningKey,
}

impl LocalKeyProvider {
    /// Create from an existing signing key.
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Generate a new random key using the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut rand_core::OsRng),
        }
    }

    /// Create from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }
}

impl KeyProvider for LocalKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        "LocalKeyProvider"
    }
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads an Ed25519 signing key from an environment variable.
///
/// The variable must hold 64 hex characters encoding the 32-byte seed.
///
/// ```bash
/// export ISSUER_SEED_HEX="deadbeef..."  # 64 hex chars
/// ```
pub struct EnvKeyProvider {
    key: SigningKey,
    var_name: String,
}

impl EnvKeyProvider {
    /// Load the signing key from the named environment variable.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KeyUnavailable`] if the variable is unset,
    /// [`CryptoError::HexDecode`] or [`CryptoError::InvalidSigningKey`] if
    /// its content is not a 32-byte hex seed.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let hex = Zeroizing::new(std::env::var(var_name).map_err(|_| {
            CryptoError::KeyUnavailable(format!("environment variable {var_name} not set"))
        })?);
        Self::from_hex_seed(var_name, &hex)
    }

    /// Build from a hex seed already read from `var_name`.
    ///
    /// Used when the caller resolves variables through its own lookup.
    pub fn from_hex_seed(var_name: &str, hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(crate::ed25519::hex_to_bytes(hex)?);
        let seed: Zeroizing<[u8; 32]> =
            Zeroizing::new(bytes.as_slice().try_into().map_err(|_| {
                CryptoError::InvalidSigningKey(format!(
                    "expected 32 bytes (64 hex chars) in {var_name}, got {} bytes",
                    bytes.len()
                ))
            })?);
        Ok(Self {
            key: SigningKey::from_bytes(&seed),
            var_name: var_name.to_string(),
        })
    }

    /// Return the environment variable name this provider was loaded from.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}
