//! # Signed Ledger Calls
//!
//! Every call that changes ledger state is wrapped in a [`LedgerCall`]
//! envelope naming the call, the paying author account, the authorization
//! being exercised, and the signing DID. The authority signs the canonical
//! bytes of that envelope; the ledger re-canonicalizes and verifies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use vd_core::{AuthorizationId, CanonicalBytes, Did};
use vd_crypto::{KeyProvider, SignResponse, VerifyingKey};

use crate::error::LedgerError;

/// Ledger account that submits (and pays for) extrinsics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorAccount(String);

impl AuthorAccount {
    /// Wrap an account address. Rejects empty or whitespace-bearing input.
    pub fn new(address: impl Into<String>) -> Result<Self, LedgerError> {
        let address = address.into();
        if address.is_empty() || address.chars().any(char::is_whitespace) {
            return Err(LedgerError::InvalidAuthor(address));
        }
        Ok(Self(address))
    }

    /// The account address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthorAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger call names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Anchor a new statement.
    #[serde(rename = "statement.register")]
    Register,
    /// Re-point a statement at a new digest.
    #[serde(rename = "statement.update")]
    Update,
    /// Revoke a statement.
    #[serde(rename = "statement.revoke")]
    Revoke,
    /// Grant a DID delegate rights in a space.
    #[serde(rename = "space.addDelegate")]
    AddDelegate,
}

impl CallKind {
    /// Wire name of the call.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "statement.register",
            Self::Update => "statement.update",
            Self::Revoke => "statement.revoke",
            Self::AddDelegate => "space.addDelegate",
        }
    }
}

/// Unsigned call envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCall {
    /// Which call this is.
    pub call: CallKind,
    /// Submitting account.
    pub author: AuthorAccount,
    /// Authorization exercised by the signer.
    pub authorization: AuthorizationId,
    /// DID whose key signs the call.
    pub signer: Did,
    /// Call-specific arguments.
    pub payload: Value,
}

impl LedgerCall {
    /// Canonical bytes the signer signs.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, LedgerError> {
        Ok(CanonicalBytes::new(self)?)
    }

    /// Sign the envelope with the authority's key provider.
    pub fn sign(self, signer: &dyn KeyProvider) -> Result<SignedCall, LedgerError> {
        let bytes = self.canonical_bytes()?;
        let proof = signer.sign_response(&bytes)?;
        Ok(SignedCall { call: self, proof })
    }
}

/// A call envelope with its authority signature, as submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedCall {
    /// The signed envelope.
    #[serde(flatten)]
    pub call: LedgerCall,
    /// Signature over the envelope's canonical bytes.
    #[serde(flatten)]
    pub proof: SignResponse,
}

impl SignedCall {
    /// Whether the signature verifies under `key`.
    pub fn verify(&self, key: &VerifyingKey) -> bool {
        self.call
            .canonical_bytes()
            .map(|bytes| key.verify(&bytes, &self.proof.signature).is_ok())
            .unwrap_or(false)
    }
}
