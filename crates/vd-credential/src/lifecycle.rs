//! # Lifecycle Manager
//!
//! Drives issue, update, and revoke against the ledger and mirrors accepted
//! results into the store. Every mutating operation follows the same order:
//!
//! 1. validate input, load the record (no dispatch on `NotFound`),
//! 2. build the new state on a copy,
//! 3. dispatch and await the ledger,
//! 4. persist only if the ledger accepted.
//!
//! The issuer key signs registrations. The registry delegate key signs
//! updates and revocations, using the authorization obtained by
//! [`LifecycleManager::initialize`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use vd_core::{
    sha256_digest, AuthorizationId, CanonicalBytes, CanonicalizationError, ContentDigest, Did,
    SchemaId, SpaceId, Timestamp,
};
use vd_crypto::KeyProvider;
use vd_ledger::{AuthorAccount, LedgerClient};

use crate::error::LifecycleError;
use crate::record::CredentialRecord;
use crate::store::{CredentialStore, StoreError};

/// Content field stamped with the time of every write.
pub const ISSUANCE_DATE_FIELD: &str = "issuanceDate";

/// Fingerprint of credential content: SHA-256 over its canonical JSON.
pub fn fingerprint(content: &Value) -> Result<ContentDigest, CanonicalizationError> {
    Ok(sha256_digest(&CanonicalBytes::new(content)?))
}

/// A DID together with the key that signs on its behalf.
#[derive(Clone)]
pub struct Authority {
    /// The authority's DID.
    pub did: Did,
    /// Its authentication key.
    pub key: Arc<dyn KeyProvider>,
}

impl std::fmt::Debug for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authority")
            .field("did", &self.did)
            .field("key", &self.key.provider_name())
            .finish()
    }
}

/// Identities and authorizations the manager acts with.
#[derive(Debug, Clone)]
pub struct Authorities {
    /// Signs registrations.
    pub issuer: Authority,
    /// Signs updates and revocations.
    pub delegate: Authority,
    /// Account submitting extrinsics.
    pub author: AuthorAccount,
    /// Space credentials are anchored in.
    pub space: SpaceId,
    /// The issuer's authorization in `space`.
    pub space_authorization: AuthorizationId,
}

/// Issues, reads, updates, and revokes credential records.
pub struct LifecycleManager {
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn CredentialStore>,
    authorities: Authorities,
    delegate_authorization: AuthorizationId,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("ledger", &self.ledger.backend_name())
            .field("store", &self.store.backend_name())
            .field("authorities", &self.authorities)
            .field("delegate_authorization", &self.delegate_authorization)
            .finish()
    }
}

impl LifecycleManager {
    /// Register the delegate in the space (idempotent) and build the manager.
    ///
    /// Must complete before serving; update and revoke depend on the
    /// delegate authorization it obtains.
    pub async fn initialize(
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn CredentialStore>,
        authorities: Authorities,
    ) -> Result<Self, LifecycleError> {
        let delegate_authorization = ledger
            .ensure_delegate(
                &authorities.space,
                &authorities.space_authorization,
                &authorities.delegate.did,
                &authorities.issuer.did,
                &authorities.author,
                authorities.issuer.key.as_ref(),
            )
            .await
            .map_err(|e| LifecycleError::Initialization(e.to_string()))?;

        tracing::info!(
            space = %authorities.space,
            delegate = %authorities.delegate.did,
            authorization = %delegate_authorization,
            ledger = ledger.backend_name(),
            store = store.backend_name(),
            "lifecycle manager initialized"
        );

        Ok(Self {
            ledger,
            store,
            authorities,
            delegate_authorization,
        })
    }

    /// The ledger client, for health probes.
    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    /// The record store, for health probes.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// The authorization used for delegate-signed dispatches.
    pub fn delegate_authorization(&self) -> &AuthorizationId {
        &self.delegate_authorization
    }

    /// Issue a credential under `schema_id`.
    pub async fn issue(
        &self,
        schema_id: &str,
        payload: Value,
    ) -> Result<CredentialRecord, LifecycleError> {
        let schema = SchemaId::new(schema_id)
            .map_err(|e| LifecycleError::InvalidArgument(e.to_string()))?;
        let Value::Object(mut content) = payload else {
            return Err(LifecycleError::InvalidArgument(
                "credential payload must be a JSON object".into(),
            ));
        };
        stamp_issuance_date(&mut content);
        let content = Value::Object(content);

        let digest = fingerprint(&content).map_err(|e| {
            tracing::error!(error = %e, schema = %schema, "failed to fingerprint credential");
            LifecycleError::IssuanceError(e.to_string())
        })?;

        let issuer = &self.authorities.issuer;
        let mut entry = self.ledger.build_issuance_statement(
            &digest,
            &self.authorities.space,
            &issuer.did,
            &schema,
        );

        let element_uri = match self
            .ledger
            .dispatch_issuance(
                &entry,
                &issuer.did,
                &self.authorities.author,
                &self.authorities.space_authorization,
                issuer.key.as_ref(),
            )
            .await
        {
            Ok(Some(uri)) if !uri.is_empty() => uri,
            Ok(_) => {
                tracing::warn!(schema = %schema, digest = %digest, "ledger declined credential registration");
                return Err(LifecycleError::IssuanceRejected);
            }
            Err(e) => {
                tracing::error!(error = %e, schema = %schema, "credential registration dispatch failed");
                return Err(LifecycleError::IssuanceError(e.to_string()));
            }
        };
        entry.element_uri = element_uri.clone();

        let now = Utc::now();
        let record = CredentialRecord {
            id: Uuid::new_v4(),
            schema_id: schema,
            identifier: element_uri,
            active: true,
            from_did: issuer.did.clone(),
            cred_hash: digest.to_prefixed_hex(),
            content,
            statement_entry: entry,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&record).await.map_err(|e| {
            tracing::error!(
                error = %e,
                identifier = %record.identifier,
                "credential anchored on ledger but not persisted"
            );
            LifecycleError::IssuanceError(e.to_string())
        })?;

        tracing::info!(
            identifier = %record.identifier,
            schema = %record.schema_id,
            cred_hash = %record.cred_hash,
            "credential issued"
        );
        Ok(record)
    }

    /// Look up a record by its current identifier.
    pub async fn get(&self, identifier: &str) -> Result<CredentialRecord, LifecycleError> {
        self.store
            .find_by_identifier(identifier)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %identifier, "credential lookup failed");
                LifecycleError::Storage(e.to_string())
            })
            .and_then(|found| {
                found.ok_or_else(|| LifecycleError::NotFound(identifier.to_string()))
            })
    }

    /// Merge `property` into the credential and re-anchor it.
    ///
    /// `property` keys replace top-level content keys. The stored record is
    /// untouched unless the ledger accepts the update.
    pub async fn update(
        &self,
        identifier: &str,
        property: &Value,
    ) -> Result<CredentialRecord, LifecycleError> {
        let Value::Object(changes) = property else {
            return Err(LifecycleError::InvalidArgument(
                "\"property\" is a required field and should be an object".into(),
            ));
        };

        let current = self.load_active(identifier, LifecycleError::UpdateError).await?;

        let mut content = match &current.content {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        for (key, value) in changes {
            content.insert(key.clone(), value.clone());
        }
        stamp_issuance_date(&mut content);
        let content = Value::Object(content);

        let digest = fingerprint(&content).map_err(|e| {
            tracing::error!(error = %e, %identifier, "failed to fingerprint updated credential");
            LifecycleError::UpdateError(e.to_string())
        })?;

        let delegate = &self.authorities.delegate;
        let mut entry = self
            .ledger
            .build_update_statement(
                &current.statement_entry.element_uri,
                &digest,
                &self.authorities.space,
                &delegate.did,
            )
            .map_err(|e| {
                tracing::error!(error = %e, %identifier, "failed to build update statement");
                LifecycleError::UpdateError(e.to_string())
            })?;

        let element_uri = match self
            .ledger
            .dispatch_update(
                &entry,
                &delegate.did,
                &self.authorities.author,
                &self.delegate_authorization,
                delegate.key.as_ref(),
            )
            .await
        {
            Ok(Some(uri)) if !uri.is_empty() => uri,
            Ok(_) => {
                tracing::warn!(%identifier, digest = %digest, "ledger declined credential update");
                return Err(LifecycleError::UpdateRejected(identifier.to_string()));
            }
            Err(e) => {
                tracing::error!(error = %e, %identifier, "credential update dispatch failed");
                return Err(LifecycleError::UpdateError(e.to_string()));
            }
        };
        entry.element_uri = element_uri.clone();

        let updated = CredentialRecord {
            identifier: element_uri,
            cred_hash: digest.to_prefixed_hex(),
            content,
            statement_entry: entry,
            ..current
        };
        let saved = self
            .store
            .save(updated)
            .await
            .map_err(|e| persist_error(e, identifier, LifecycleError::UpdateError))?;

        tracing::info!(
            previous = %identifier,
            identifier = %saved.identifier,
            cred_hash = %saved.cred_hash,
            "credential updated"
        );
        Ok(saved)
    }

    /// Revoke the credential on the ledger and mark the record inactive.
    pub async fn revoke(&self, identifier: &str) -> Result<CredentialRecord, LifecycleError> {
        let current = self.load_active(identifier, LifecycleError::RevokeError).await?;

        let delegate = &self.authorities.delegate;
        match self
            .ledger
            .dispatch_revoke(
                &current.statement_entry.element_uri,
                &delegate.did,
                &self.authorities.author,
                &self.delegate_authorization,
                delegate.key.as_ref(),
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(%identifier, "ledger declined credential revocation");
                return Err(LifecycleError::RevokeRejected(identifier.to_string()));
            }
            Err(e) => {
                tracing::error!(error = %e, %identifier, "credential revocation dispatch failed");
                return Err(LifecycleError::RevokeError(e.to_string()));
            }
        }

        let revoked = CredentialRecord {
            active: false,
            ..current
        };
        let saved = self
            .store
            .save(revoked)
            .await
            .map_err(|e| persist_error(e, identifier, LifecycleError::RevokeError))?;

        tracing::info!(%identifier, "credential revoked");
        Ok(saved)
    }

    async fn load_active(
        &self,
        identifier: &str,
        fault: fn(String) -> LifecycleError,
    ) -> Result<CredentialRecord, LifecycleError> {
        let record = self
            .store
            .find_by_identifier(identifier)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %identifier, "credential lookup failed");
                fault(e.to_string())
            })?
            .ok_or_else(|| LifecycleError::NotFound(identifier.to_string()))?;
        if !record.active {
            return Err(LifecycleError::Revoked(identifier.to_string()));
        }
        Ok(record)
    }
}

fn stamp_issuance_date(content: &mut Map<String, Value>) {
    content.insert(
        ISSUANCE_DATE_FIELD.to_string(),
        Value::String(Timestamp::now().to_iso_string()),
    );
}

fn persist_error(
    err: StoreError,
    identifier: &str,
    fault: fn(String) -> LifecycleError,
) -> LifecycleError {
    match err {
        StoreError::Conflict { .. } | StoreError::Duplicate(_) => {
            tracing::warn!(error = %err, %identifier, "ledger accepted dispatch but record changed concurrently");
            LifecycleError::Conflict(err.to_string())
        }
        other => {
            tracing::error!(error = %other, %identifier, "ledger accepted dispatch but record not persisted");
            fault(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_ignores_key_order() {
        let a = json!({"name": "Alice", "age": 30});
        let b = json!({"age": 30, "name": "Alice"});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let a = json!({"name": "Alice"});
        let b = json!({"name": "Bob"});
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn fingerprint_keeps_sub_second_precision() {
        let a = json!({"issuanceDate": "2026-01-15T12:00:00.100Z"});
        let b = json!({"issuanceDate": "2026-01-15T12:00:00.900Z"});
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn stamp_overwrites_issuance_date() {
        let mut map = Map::new();
        map.insert(ISSUANCE_DATE_FIELD.into(), json!("1999-01-01T00:00:00.000Z"));
        stamp_issuance_date(&mut map);
        assert_ne!(map[ISSUANCE_DATE_FIELD], json!("1999-01-01T00:00:00.000Z"));
        assert!(map[ISSUANCE_DATE_FIELD].as_str().unwrap().ends_with('Z'));
    }
}
