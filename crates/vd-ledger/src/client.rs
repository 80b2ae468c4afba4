//! # Ledger Client Interface
//!
//! The async interface the lifecycle manager drives. Statement construction
//! is provided (pure and deterministic); dispatch is backend-specific.
//!
//! Dispatch results distinguish a *rejection* (`Ok(None)` / `Ok(false)`:
//! the ledger processed the call and declined it) from a *fault*
//! (`Err(LedgerError)`: the call's fate is unknown or it never reached the
//! ledger).

use async_trait::async_trait;

use vd_core::{AuthorizationId, ContentDigest, Did, SchemaId, SpaceId};
use vd_crypto::KeyProvider;

use crate::call::AuthorAccount;
use crate::error::LedgerError;
use crate::statement::StatementEntry;

/// Client for the credential ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Build the registration statement for a new credential digest.
    fn build_issuance_statement(
        &self,
        digest: &ContentDigest,
        space: &SpaceId,
        issuer: &Did,
        schema: &SchemaId,
    ) -> StatementEntry {
        StatementEntry::from_properties(digest, space, issuer, Some(schema))
    }

    /// Build the update statement re-pointing `prior_element_uri` at `digest`.
    fn build_update_statement(
        &self,
        prior_element_uri: &str,
        digest: &ContentDigest,
        space: &SpaceId,
        delegate: &Did,
    ) -> Result<StatementEntry, LedgerError> {
        StatementEntry::from_update_properties(prior_element_uri, digest, space, delegate)
    }

    /// Register a statement, signed by the issuer.
    ///
    /// Returns the accepted element URI, or `None` if the ledger declined.
    async fn dispatch_issuance(
        &self,
        entry: &StatementEntry,
        issuer: &Did,
        author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<Option<String>, LedgerError>;

    /// Update a statement, signed by the registry delegate.
    ///
    /// Returns the new element URI, or `None` if the ledger declined.
    async fn dispatch_update(
        &self,
        entry: &StatementEntry,
        delegate: &Did,
        author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<Option<String>, LedgerError>;

    /// Revoke the statement at `element_uri`, signed by the registry delegate.
    ///
    /// Returns `false` if the ledger declined.
    async fn dispatch_revoke(
        &self,
        element_uri: &str,
        delegate: &Did,
        author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<bool, LedgerError>;

    /// Make sure `delegate` holds delegate rights in `space`, granting them
    /// with the issuer's space authorization if needed.
    ///
    /// Idempotent: returns the delegate's existing authorization if it is
    /// already registered.
    async fn ensure_delegate(
        &self,
        space: &SpaceId,
        space_authorization: &AuthorizationId,
        delegate: &Did,
        issuer: &Did,
        author: &AuthorAccount,
        issuer_signer: &dyn KeyProvider,
    ) -> Result<AuthorizationId, LedgerError>;

    /// Connectivity probe.
    async fn health(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    /// Backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}
