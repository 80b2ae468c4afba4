//! Ledger client error types.

use vd_core::CanonicalizationError;
use vd_crypto::CryptoError;

use crate::config::ConfigError;

/// Errors from ledger operations.
///
/// A ledger that *declines* a dispatch is not an error: dispatch methods
/// report that as `Ok(None)` / `Ok(false)`. These variants are faults.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Logical endpoint, e.g. `POST /v1/statements`.
        endpoint: String,
        /// Underlying transport failure.
        source: reqwest::Error,
    },

    /// Ledger gateway returned an unexpected status.
    #[error("ledger {endpoint} returned {status}: {body}")]
    Api {
        /// Logical endpoint.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Logical endpoint.
        endpoint: String,
        /// Underlying decode failure.
        source: reqwest::Error,
    },

    /// The authority's key provider failed to sign.
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),

    /// The call envelope could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// An element URI does not have the `stmt:<network>:<id>:<digest>` shape.
    #[error("invalid statement URI: \"{0}\"")]
    InvalidStatementUri(String),

    /// An author account address is empty or malformed.
    #[error("invalid author account address: \"{0}\"")]
    InvalidAuthor(String),

    /// The ledger refused a control-plane call (delegate registration).
    #[error("ledger rejected {call}: {reason}")]
    Rejected {
        /// Call name.
        call: &'static str,
        /// Reason reported by the ledger.
        reason: String,
    },

    /// The ledger is not reachable or not accepting calls.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
