//! Credential persistence on the `credentials` table.
//!
//! `save` is a compare-and-set on `version`: the `UPDATE` only matches the
//! row the caller read, and a miss is disambiguated into `Conflict` or
//! `Missing` with a follow-up existence check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vd_core::{Did, SchemaId};
use vd_credential::{CredentialRecord, CredentialStore, StoreError};

const COLUMNS: &str = "id, schema_id, identifier, active, from_did, cred_hash, content, \
                       statement_entry, version, created_at, updated_at";

/// Postgres-backed [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Wrap a connected pool. Migrations must already have run.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {COLUMNS} FROM credentials WHERE identifier = $1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error(e, identifier))?;

        row.map(CredentialRow::into_record).transpose()
    }

    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let statement_entry = entry_json(record)?;
        sqlx::query(
            "INSERT INTO credentials (id, schema_id, identifier, active, from_did, cred_hash,
             content, statement_entry, version, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(record.id)
        .bind(record.schema_id.as_str())
        .bind(&record.identifier)
        .bind(record.active)
        .bind(record.from_did.as_str())
        .bind(&record.cred_hash)
        .bind(&record.content)
        .bind(statement_entry)
        .bind(record.version)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| backend_error(e, &record.identifier))?;

        Ok(())
    }

    async fn save(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let statement_entry = entry_json(&record)?;
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "UPDATE credentials SET identifier = $2, active = $3, cred_hash = $4, content = $5,
             statement_entry = $6, version = version + 1, updated_at = $8
             WHERE id = $1 AND version = $7
             RETURNING {COLUMNS}"
        ))
        .bind(record.id)
        .bind(&record.identifier)
        .bind(record.active)
        .bind(&record.cred_hash)
        .bind(&record.content)
        .bind(statement_entry)
        .bind(record.version)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error(e, &record.identifier))?;

        if let Some(row) = row {
            return row.into_record();
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM credentials WHERE id = $1)")
                .bind(record.id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

        if exists {
            Err(StoreError::Conflict {
                id: record.id,
                expected: record.version,
            })
        } else {
            Err(StoreError::Missing(record.id))
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn backend_error(err: sqlx::Error, identifier: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(identifier.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn entry_json(record: &CredentialRecord) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(&record.statement_entry)
        .map_err(|e| StoreError::Backend(format!("statement entry encoding: {e}")))
}

/// Internal row type for SQLx mapping.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    schema_id: String,
    identifier: String,
    active: bool,
    from_did: String,
    cred_hash: String,
    content: serde_json::Value,
    statement_entry: serde_json::Value,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_record(self) -> Result<CredentialRecord, StoreError> {
        let id = self.id;
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            StoreError::Backend(format!("row {id}: invalid {field}: {e}"))
        };
        let schema_id = SchemaId::new(self.schema_id).map_err(|e| corrupt("schema_id", &e))?;
        let from_did = Did::new(self.from_did).map_err(|e| corrupt("from_did", &e))?;
        let statement_entry = serde_json::from_value(self.statement_entry)
            .map_err(|e| corrupt("statement_entry", &e))?;

        Ok(CredentialRecord {
            id: self.id,
            schema_id,
            identifier: self.identifier,
            active: self.active,
            from_did,
            cred_hash: self.cred_hash,
            content: self.content,
            statement_entry,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
