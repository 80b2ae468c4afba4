//! Shared fixtures: a scripted ledger whose dispatch results are queued by
//! the test, a store wrapper that counts lookups, and one that lets another
//! writer land between a lookup and the following save.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use vd_core::{AuthorizationId, ContentDigest, Did, SpaceId};
use vd_credential::{
    Authorities, Authority, CredentialRecord, CredentialStore, InMemoryCredentialStore,
    LifecycleManager, StoreError,
};
use vd_crypto::{KeyProvider, LocalKeyProvider, VerifyingKey};
use vd_ledger::{AuthorAccount, LedgerClient, LedgerError, StatementEntry};

/// One observed dispatch.
#[derive(Debug, Clone)]
pub struct Seen {
    pub call: &'static str,
    pub signer: Did,
    pub key: VerifyingKey,
    pub authorization: AuthorizationId,
}

/// Queued outcome for the next dispatch.
pub enum Outcome {
    Uri(Option<String>),
    Revoked(bool),
    Fault,
}

#[derive(Default)]
pub struct ScriptedLedger {
    queue: Mutex<VecDeque<Outcome>>,
    seen: Mutex<Vec<Seen>>,
    fail_delegate: bool,
}

impl ScriptedLedger {
    /// A ledger on which delegate registration always fails.
    pub fn failing_delegate() -> Self {
        Self {
            fail_delegate: true,
            ..Self::default()
        }
    }

    pub fn push(&self, outcome: Outcome) {
        self.queue.lock().unwrap().push_back(outcome);
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn observe(
        &self,
        call: &'static str,
        signer: &Did,
        authorization: &AuthorizationId,
        key: &dyn KeyProvider,
    ) -> Option<Outcome> {
        self.seen.lock().unwrap().push(Seen {
            call,
            signer: signer.clone(),
            key: key.verifying_key().unwrap(),
            authorization: authorization.clone(),
        });
        self.queue.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    fn build_update_statement(
        &self,
        prior_element_uri: &str,
        digest: &ContentDigest,
        space: &SpaceId,
        delegate: &Did,
    ) -> Result<StatementEntry, LedgerError> {
        Ok(StatementEntry {
            element_uri: prior_element_uri.to_string(),
            digest: digest.to_prefixed_hex(),
            creator_uri: delegate.clone(),
            space_uri: space.clone(),
            schema_uri: None,
        })
    }

    async fn dispatch_issuance(
        &self,
        _entry: &StatementEntry,
        issuer: &Did,
        _author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<Option<String>, LedgerError> {
        match self.observe("register", issuer, authorization, signer) {
            Some(Outcome::Uri(uri)) => Ok(uri),
            Some(Outcome::Fault) => Err(LedgerError::Unavailable("scripted fault".into())),
            _ => Ok(None),
        }
    }

    async fn dispatch_update(
        &self,
        _entry: &StatementEntry,
        delegate: &Did,
        _author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<Option<String>, LedgerError> {
        match self.observe("update", delegate, authorization, signer) {
            Some(Outcome::Uri(uri)) => Ok(uri),
            Some(Outcome::Fault) => Err(LedgerError::Unavailable("scripted fault".into())),
            _ => Ok(None),
        }
    }

    async fn dispatch_revoke(
        &self,
        _element_uri: &str,
        delegate: &Did,
        _author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<bool, LedgerError> {
        match self.observe("revoke", delegate, authorization, signer) {
            Some(Outcome::Revoked(done)) => Ok(done),
            Some(Outcome::Fault) => Err(LedgerError::Unavailable("scripted fault".into())),
            _ => Ok(false),
        }
    }

    async fn ensure_delegate(
        &self,
        _space: &SpaceId,
        _space_authorization: &AuthorizationId,
        _delegate: &Did,
        _issuer: &Did,
        _author: &AuthorAccount,
        _issuer_signer: &dyn KeyProvider,
    ) -> Result<AuthorizationId, LedgerError> {
        if self.fail_delegate {
            return Err(LedgerError::Rejected {
                call: "space.addDelegate",
                reason: "issuer is not the space owner".into(),
            });
        }
        Ok(AuthorizationId::new("auth:cord:delegate").unwrap())
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

/// Store that counts `find_by_identifier` calls.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryCredentialStore,
    lookups: AtomicUsize,
}

impl CountingStore {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_identifier(identifier).await
    }

    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        self.inner.insert(record).await
    }

    async fn save(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError> {
        self.inner.save(record).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Store where, once armed, the next lookup is followed by a competing
/// write that renames the credential to "Carol". The caller still receives
/// the record as it was before that write.
#[derive(Default)]
pub struct InterleavedStore {
    pub inner: InMemoryCredentialStore,
    armed: AtomicBool,
}

impl InterleavedStore {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for InterleavedStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let found = self.inner.find_by_identifier(identifier).await?;
        if let Some(record) = &found {
            if self.armed.swap(false, Ordering::SeqCst) {
                let mut competing = record.clone();
                competing.content["name"] = json!("Carol");
                self.inner.save(competing).await?;
            }
        }
        Ok(found)
    }

    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        self.inner.insert(record).await
    }

    async fn save(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError> {
        self.inner.save(record).await
    }

    fn backend_name(&self) -> &'static str {
        "interleaved"
    }
}

pub struct Keys {
    pub issuer: Arc<LocalKeyProvider>,
    pub delegate: Arc<LocalKeyProvider>,
}

pub fn keys() -> Keys {
    Keys {
        issuer: Arc::new(LocalKeyProvider::from_seed(&[0x11; 32])),
        delegate: Arc::new(LocalKeyProvider::from_seed(&[0x22; 32])),
    }
}

pub fn authorities(keys: &Keys) -> Authorities {
    Authorities {
        issuer: Authority {
            did: Did::new("did:cord:issuer").unwrap(),
            key: keys.issuer.clone(),
        },
        delegate: Authority {
            did: Did::new("did:cord:delegate").unwrap(),
            key: keys.delegate.clone(),
        },
        author: AuthorAccount::new("5Author").unwrap(),
        space: SpaceId::new("space:cord:registry").unwrap(),
        space_authorization: AuthorizationId::new("auth:cord:owner").unwrap(),
    }
}

pub struct Harness {
    pub manager: LifecycleManager,
    pub ledger: Arc<ScriptedLedger>,
    pub store: Arc<CountingStore>,
    pub keys: Keys,
}

pub async fn harness() -> Harness {
    let ledger = Arc::new(ScriptedLedger::default());
    let store = Arc::new(CountingStore::default());
    let keys = keys();
    let manager = LifecycleManager::initialize(ledger.clone(), store.clone(), authorities(&keys))
        .await
        .unwrap();
    Harness {
        manager,
        ledger,
        store,
        keys,
    }
}

pub fn name_of(record: &CredentialRecord) -> Option<&str> {
    record.content.get("name").and_then(Value::as_str)
}
