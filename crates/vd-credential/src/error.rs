//! Lifecycle error taxonomy.
//!
//! `*Rejected` means the ledger processed the dispatch and declined it.
//! `*Error` means a fault: serialization, signing, transport, or storage.
//! Neither leaves a record with a hash that does not match its content.

use thiserror::Error;

/// Errors from lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Caller input is malformed. Raised before any lookup or dispatch.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No record holds the identifier.
    #[error("credential not found: {0}")]
    NotFound(String),

    /// The record has been revoked and can no longer change.
    #[error("credential {0} is revoked")]
    Revoked(String),

    /// The ledger declined the registration.
    #[error("credential not issued: ledger declined the registration")]
    IssuanceRejected,

    /// The ledger declined the update.
    #[error("credential {0} not updated: ledger declined the update")]
    UpdateRejected(String),

    /// The ledger declined the revocation.
    #[error("credential {0} not revoked: ledger declined the revocation")]
    RevokeRejected(String),

    /// Fault while issuing.
    #[error("issuance failed: {0}")]
    IssuanceError(String),

    /// Fault while updating.
    #[error("update failed: {0}")]
    UpdateError(String),

    /// Fault while revoking.
    #[error("revocation failed: {0}")]
    RevokeError(String),

    /// The record changed between read and write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store failed on a read.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Startup delegate registration failed.
    #[error("initialization failed: {0}")]
    Initialization(String),
}
