//! Lifecycle behaviour against a scripted ledger: happy path, rejections,
//! faults, and input validation ordering.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{harness, name_of, InterleavedStore, Outcome, ScriptedLedger};
use vd_credential::{fingerprint, InMemoryCredentialStore, LifecycleError, LifecycleManager};
use vd_crypto::KeyProvider;

#[tokio::test]
async fn issue_update_revoke_scenario() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Uri(Some("stmt:2".into())));
    h.ledger.push(Outcome::Revoked(true));

    let issued = h
        .manager
        .issue("schema:cord:1", json!({"name": "Alice"}))
        .await
        .unwrap();
    assert!(issued.active);
    assert_eq!(issued.identifier, "stmt:1");
    assert_eq!(issued.schema_id.as_str(), "schema:cord:1");
    assert_eq!(issued.from_did.as_str(), "did:cord:issuer");
    assert!(issued.content.get("issuanceDate").is_some());
    assert_eq!(issued.cred_hash, fingerprint(&issued.content).unwrap().to_prefixed_hex());

    let updated = h
        .manager
        .update("stmt:1", &json!({"name": "Bob"}))
        .await
        .unwrap();
    assert_eq!(updated.identifier, "stmt:2");
    assert_eq!(name_of(&updated), Some("Bob"));
    assert_eq!(updated.id, issued.id);
    assert_ne!(updated.cred_hash, issued.cred_hash);
    assert_eq!(updated.cred_hash, fingerprint(&updated.content).unwrap().to_prefixed_hex());
    assert_eq!(updated.statement_entry.element_uri, "stmt:2");

    let revoked = h.manager.revoke("stmt:2").await.unwrap();
    assert!(!revoked.active);

    let fetched = h.manager.get("stmt:2").await.unwrap();
    assert!(!fetched.active);
    assert_eq!(fetched.identifier, "stmt:2");
    assert!(matches!(
        h.manager.get("stmt:1").await,
        Err(LifecycleError::NotFound(_))
    ));
}

#[tokio::test]
async fn issuer_signs_registration_and_delegate_signs_the_rest() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Uri(Some("stmt:2".into())));
    h.ledger.push(Outcome::Revoked(true));

    h.manager.issue("schema:cord:1", json!({"name": "Alice"})).await.unwrap();
    h.manager.update("stmt:1", &json!({"name": "Bob"})).await.unwrap();
    h.manager.revoke("stmt:2").await.unwrap();

    let seen = h.ledger.seen();
    let issuer_vk = h.keys.issuer.verifying_key().unwrap();
    let delegate_vk = h.keys.delegate.verifying_key().unwrap();

    assert_eq!(seen[0].call, "register");
    assert_eq!(seen[0].signer.as_str(), "did:cord:issuer");
    assert_eq!(seen[0].key, issuer_vk);
    assert_eq!(seen[0].authorization.as_str(), "auth:cord:owner");

    for s in &seen[1..] {
        assert_eq!(s.signer.as_str(), "did:cord:delegate");
        assert_eq!(s.key, delegate_vk);
        assert_eq!(s.authorization.as_str(), "auth:cord:delegate");
    }
}

#[tokio::test]
async fn get_unknown_is_not_found() {
    let h = harness().await;
    assert!(matches!(
        h.manager.get("unknown").await,
        Err(LifecycleError::NotFound(id)) if id == "unknown"
    ));
}

#[tokio::test]
async fn update_unknown_makes_no_dispatch() {
    let h = harness().await;
    let err = h
        .manager
        .update("stmt:404", &json!({"name": "Bob"}))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
    assert_eq!(h.ledger.dispatch_count(), 0);
}

#[tokio::test]
async fn revoke_unknown_makes_no_dispatch() {
    let h = harness().await;
    let err = h.manager.revoke("stmt:404").await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
    assert_eq!(h.ledger.dispatch_count(), 0);
}

#[tokio::test]
async fn update_property_must_be_object_before_lookup() {
    let h = harness().await;
    for bad in [json!(null), json!("Bob"), json!(["name"]), json!(7)] {
        let err = h.manager.update("stmt:1", &bad).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidArgument(_)), "{bad}");
    }
    assert_eq!(h.store.lookups(), 0);
    assert_eq!(h.ledger.dispatch_count(), 0);
}

#[tokio::test]
async fn issue_validates_schema_and_payload() {
    let h = harness().await;
    assert!(matches!(
        h.manager.issue("not-a-schema", json!({"name": "A"})).await,
        Err(LifecycleError::InvalidArgument(_))
    ));
    assert!(matches!(
        h.manager.issue("schema:cord:1", json!([1, 2])).await,
        Err(LifecycleError::InvalidArgument(_))
    ));
    assert_eq!(h.ledger.dispatch_count(), 0);
}

#[tokio::test]
async fn rejected_issuance_leaves_store_empty() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(None));
    h.ledger.push(Outcome::Uri(Some(String::new())));

    for _ in 0..2 {
        let err = h
            .manager
            .issue("schema:cord:1", json!({"name": "Alice"}))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::IssuanceRejected));
    }
    assert!(h.store.inner.is_empty());
}

#[tokio::test]
async fn faulted_issuance_leaves_store_empty() {
    let h = harness().await;
    h.ledger.push(Outcome::Fault);
    let err = h
        .manager
        .issue("schema:cord:1", json!({"name": "Alice"}))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::IssuanceError(_)));
    assert!(h.store.inner.is_empty());
}

#[tokio::test]
async fn fractional_values_are_issued_and_fingerprinted() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));

    let issued = h
        .manager
        .issue("schema:cord:1", json!({"name": "Alice", "gpa": 3.5}))
        .await
        .unwrap();
    assert_eq!(issued.content["gpa"], json!(3.5));
    assert_eq!(issued.cred_hash, fingerprint(&issued.content).unwrap().to_prefixed_hex());
    assert_ne!(
        fingerprint(&json!({"name": "Alice", "gpa": 3.5})).unwrap(),
        fingerprint(&json!({"name": "Alice", "gpa": 3.6})).unwrap()
    );
}

#[tokio::test]
async fn rejected_update_leaves_record_unchanged() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Uri(None));

    let issued = h
        .manager
        .issue("schema:cord:1", json!({"name": "Alice"}))
        .await
        .unwrap();
    let err = h
        .manager
        .update("stmt:1", &json!({"name": "Bob"}))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::UpdateRejected(_)));
    assert_eq!(h.manager.get("stmt:1").await.unwrap(), issued);
}

#[tokio::test]
async fn faulted_update_leaves_record_unchanged() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Fault);

    let issued = h
        .manager
        .issue("schema:cord:1", json!({"name": "Alice"}))
        .await
        .unwrap();
    let err = h
        .manager
        .update("stmt:1", &json!({"name": "Bob"}))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::UpdateError(_)));
    assert_eq!(h.manager.get("stmt:1").await.unwrap(), issued);
}

#[tokio::test]
async fn update_merges_shallowly() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Uri(Some("stmt:2".into())));

    h.manager
        .issue(
            "schema:cord:1",
            json!({"name": "Alice", "address": {"city": "Lahore", "zip": "54000"}}),
        )
        .await
        .unwrap();
    let updated = h
        .manager
        .update("stmt:1", &json!({"address": {"city": "Karachi"}}))
        .await
        .unwrap();
    assert_eq!(name_of(&updated), Some("Alice"));
    assert_eq!(updated.content["address"], json!({"city": "Karachi"}));
}

#[tokio::test]
async fn rejected_revoke_keeps_record_active() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Revoked(false));

    h.manager.issue("schema:cord:1", json!({"name": "Alice"})).await.unwrap();
    let err = h.manager.revoke("stmt:1").await.unwrap_err();
    assert!(matches!(err, LifecycleError::RevokeRejected(_)));
    assert!(h.manager.get("stmt:1").await.unwrap().active);
}

#[tokio::test]
async fn faulted_revoke_is_structured_error() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Fault);

    h.manager.issue("schema:cord:1", json!({"name": "Alice"})).await.unwrap();
    let err = h.manager.revoke("stmt:1").await.unwrap_err();
    assert!(matches!(err, LifecycleError::RevokeError(_)));
    assert!(h.manager.get("stmt:1").await.unwrap().active);
}

#[tokio::test]
async fn revoked_record_cannot_change() {
    let h = harness().await;
    h.ledger.push(Outcome::Uri(Some("stmt:1".into())));
    h.ledger.push(Outcome::Revoked(true));

    h.manager.issue("schema:cord:1", json!({"name": "Alice"})).await.unwrap();
    h.manager.revoke("stmt:1").await.unwrap();
    let before = h.ledger.dispatch_count();

    assert!(matches!(
        h.manager.update("stmt:1", &json!({"name": "Bob"})).await,
        Err(LifecycleError::Revoked(_))
    ));
    assert!(matches!(
        h.manager.revoke("stmt:1").await,
        Err(LifecycleError::Revoked(_))
    ));
    assert_eq!(h.ledger.dispatch_count(), before);
}

#[tokio::test]
async fn initialization_failure_is_reported() {
    let ledger = Arc::new(ScriptedLedger::failing_delegate());
    let keys = common::keys();
    let err = LifecycleManager::initialize(
        ledger,
        Arc::new(InMemoryCredentialStore::new()),
        common::authorities(&keys),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LifecycleError::Initialization(_)));
}

async fn interleaved() -> (LifecycleManager, Arc<ScriptedLedger>, Arc<InterleavedStore>) {
    let ledger = Arc::new(ScriptedLedger::default());
    let store = Arc::new(InterleavedStore::default());
    let keys = common::keys();
    let manager =
        LifecycleManager::initialize(ledger.clone(), store.clone(), common::authorities(&keys))
            .await
            .unwrap();
    (manager, ledger, store)
}

#[tokio::test]
async fn update_losing_concurrent_write_is_conflict() {
    let (manager, ledger, store) = interleaved().await;
    ledger.push(Outcome::Uri(Some("stmt:1".into())));
    ledger.push(Outcome::Uri(Some("stmt:2".into())));

    let issued = manager.issue("schema:cord:1", json!({"name": "Alice"})).await.unwrap();
    store.arm();
    let err = manager
        .update("stmt:1", &json!({"name": "Bob"}))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(_)));
    assert_eq!(ledger.dispatch_count(), 2);

    let stored = manager.get("stmt:1").await.unwrap();
    assert_eq!(name_of(&stored), Some("Carol"));
    assert_eq!(stored.version, issued.version + 1);
    assert!(matches!(
        manager.get("stmt:2").await,
        Err(LifecycleError::NotFound(_))
    ));
}

#[tokio::test]
async fn revoke_losing_concurrent_write_is_conflict() {
    let (manager, ledger, store) = interleaved().await;
    ledger.push(Outcome::Uri(Some("stmt:1".into())));
    ledger.push(Outcome::Revoked(true));

    manager.issue("schema:cord:1", json!({"name": "Alice"})).await.unwrap();
    store.arm();
    let err = manager.revoke("stmt:1").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(_)));

    let stored = manager.get("stmt:1").await.unwrap();
    assert!(stored.active);
    assert_eq!(name_of(&stored), Some("Carol"));
}
