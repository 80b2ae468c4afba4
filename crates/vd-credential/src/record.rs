//! Local mirror of a ledger-anchored credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use vd_core::{Did, SchemaId};
use vd_ledger::StatementEntry;

/// A credential record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Stable row id. Unlike `identifier`, never changes.
    pub id: Uuid,
    /// Schema the credential conforms to.
    pub schema_id: SchemaId,
    /// Current element URI on the ledger.
    pub identifier: String,
    /// `false` once revoked.
    pub active: bool,
    /// Issuer DID.
    pub from_did: Did,
    /// `0x`-prefixed fingerprint of `content`.
    pub cred_hash: String,
    /// Credential payload including `issuanceDate`.
    pub content: Value,
    /// Statement from the last accepted dispatch.
    pub statement_entry: StatementEntry,
    /// Optimistic concurrency version, incremented on every save.
    pub version: i64,
    /// When the record was first persisted.
    pub created_at: DateTime<Utc>,
    /// When the record was last persisted.
    pub updated_at: DateTime<Utc>,
}
