//! # Credential Record Store
//!
//! Persistence interface for credential records plus an in-memory
//! implementation. `save` is an optimistic compare-and-set on `version`,
//! which is what keeps concurrent updates and revocations of the same
//! record from silently overwriting each other.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::record::CredentialRecord;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored version no longer matches the version being saved.
    #[error("credential {id} was modified concurrently (expected version {expected})")]
    Conflict {
        /// Record id.
        id: Uuid,
        /// Version the caller read.
        expected: i64,
    },

    /// Another record already holds this identifier.
    #[error("identifier already in use: {0}")]
    Duplicate(String),

    /// The record to save does not exist.
    #[error("credential {0} not found")]
    Missing(Uuid),

    /// Backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence for credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the record currently holding `identifier`.
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// Insert a new record.
    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError>;

    /// Persist `record` if the stored version equals `record.version`.
    ///
    /// Returns the record as stored, with `version` incremented and
    /// `updated_at` refreshed.
    async fn save(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

/// Thread-safe in-memory store.
///
/// The lock is `parking_lot` and is never held across `.await` points.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    data: Arc<RwLock<HashMap<Uuid, CredentialRecord>>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, in no particular order.
    pub fn list(&self) -> Vec<CredentialRecord> {
        self.data.read().values().cloned().collect()
    }
}

fn identifier_taken(
    data: &HashMap<Uuid, CredentialRecord>,
    identifier: &str,
    except: Uuid,
) -> bool {
    data.values()
        .any(|r| r.id != except && r.identifier == identifier)
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .data
            .read()
            .values()
            .find(|r| r.identifier == identifier)
            .cloned())
    }

    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let mut guard = self.data.write();
        if guard.contains_key(&record.id) || identifier_taken(&guard, &record.identifier, record.id)
        {
            return Err(StoreError::Duplicate(record.identifier.clone()));
        }
        guard.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, mut record: CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let mut guard = self.data.write();
        let stored_version = guard
            .get(&record.id)
            .map(|r| r.version)
            .ok_or(StoreError::Missing(record.id))?;
        if stored_version != record.version {
            return Err(StoreError::Conflict {
                id: record.id,
                expected: record.version,
            });
        }
        if identifier_taken(&guard, &record.identifier, record.id) {
            return Err(StoreError::Duplicate(record.identifier));
        }
        record.version += 1;
        record.updated_at = Utc::now();
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vd_core::{ContentDigest, Did, SchemaId, SpaceId};
    use vd_ledger::StatementEntry;

    fn record(identifier: &str) -> CredentialRecord {
        let issuer = Did::new("did:cord:issuer").unwrap();
        let entry = StatementEntry::from_properties(
            &ContentDigest::sha256([1; 32]),
            &SpaceId::new("space:cord:s1").unwrap(),
            &issuer,
            None,
        );
        CredentialRecord {
            id: Uuid::new_v4(),
            schema_id: SchemaId::new("schema:cord:1").unwrap(),
            identifier: identifier.to_string(),
            active: true,
            from_did: issuer,
            cred_hash: "0x00".into(),
            content: json!({"name": "Alice"}),
            statement_entry: entry,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = InMemoryCredentialStore::new();
        store.insert(&record("stmt:1")).await.unwrap();
        assert!(store.find_by_identifier("stmt:1").await.unwrap().is_some());
        assert!(store.find_by_identifier("stmt:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_identifier_rejected() {
        let store = InMemoryCredentialStore::new();
        store.insert(&record("stmt:1")).await.unwrap();
        let err = store.insert(&record("stmt:1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn save_increments_version() {
        let store = InMemoryCredentialStore::new();
        let mut r = record("stmt:1");
        store.insert(&r).await.unwrap();
        r.identifier = "stmt:2".into();
        let saved = store.save(r).await.unwrap();
        assert_eq!(saved.version, 1);
        assert!(store.find_by_identifier("stmt:1").await.unwrap().is_none());
        assert_eq!(
            store.find_by_identifier("stmt:2").await.unwrap().unwrap().version,
            1
        );
    }

    #[tokio::test]
    async fn stale_save_conflicts() {
        let store = InMemoryCredentialStore::new();
        let r = record("stmt:1");
        store.insert(&r).await.unwrap();

        let mut first = r.clone();
        first.active = false;
        store.save(first).await.unwrap();

        let mut second = r;
        second.identifier = "stmt:2".into();
        let err = store.save(second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, .. }));
        let current = store.find_by_identifier("stmt:1").await.unwrap().unwrap();
        assert!(!current.active);
    }

    #[tokio::test]
    async fn save_missing_record() {
        let store = InMemoryCredentialStore::new();
        let err = store.save(record("stmt:9")).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
    }
}
