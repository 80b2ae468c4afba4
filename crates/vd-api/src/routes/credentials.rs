//! # Credential Lifecycle Endpoints
//!
//! Thin handlers over [`vd_credential::LifecycleManager`]. Each handler
//! checks the caller's role, forwards to the manager, and shapes the result.
//! Ledger rejections and faults come back through [`AppError`].
//!
//! ## Endpoints
//!
//! All four share one path segment. For `POST` it names the schema to issue
//! under; for the others it is the credential's current element URI.
//!
//! - `POST   /v1/credentials/{id}`: Issue under schema `id`.
//! - `GET    /v1/credentials/{id}`: Read.
//! - `PATCH  /v1/credentials/{id}`: Merge properties and re-anchor.
//! - `DELETE /v1/credentials/{id}`: Revoke.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use vd_credential::CredentialRecord;
use vd_ledger::StatementEntry;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Statement anchoring the current version of a credential.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatementEntryView {
    pub element_uri: String,
    pub digest: String,
    pub creator_uri: String,
    pub space_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,
}

impl From<StatementEntry> for StatementEntryView {
    fn from(entry: StatementEntry) -> Self {
        Self {
            element_uri: entry.element_uri,
            digest: entry.digest,
            creator_uri: entry.creator_uri.to_string(),
            space_uri: entry.space_uri.to_string(),
            schema_uri: entry.schema_uri.map(|s| s.to_string()),
        }
    }
}

/// A credential record as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialView {
    pub id: Uuid,
    pub schema_id: String,
    /// Current element URI. Changes after every accepted update.
    pub identifier: String,
    pub active: bool,
    pub from_did: String,
    /// `0x`-prefixed SHA-256 of the canonical content.
    pub cred_hash: String,
    pub content: serde_json::Value,
    pub statement_entry: StatementEntryView,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CredentialRecord> for CredentialView {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            schema_id: record.schema_id.to_string(),
            identifier: record.identifier,
            active: record.active,
            from_did: record.from_did.to_string(),
            cred_hash: record.cred_hash,
            content: record.content,
            statement_entry: record.statement_entry.into(),
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response from issue and update.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialMutationResponse {
    /// `"success"` on issue, `"updated"` on update.
    pub result: String,
    pub identifier: String,
    pub credential: CredentialView,
}

/// Response from read.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialResponse {
    pub credential: CredentialView,
}

/// Request body for update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCredentialRequest {
    /// Fields to merge into the credential content. Must be an object.
    #[serde(default)]
    pub property: serde_json::Value,
}

/// Response from revoke.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeResponse {
    /// Always `"revoked"`.
    pub result: String,
    pub identifier: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the credentials router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/v1/credentials/{id}",
        post(issue_credential)
            .get(get_credential)
            .patch(update_credential)
            .delete(revoke_credential),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/credentials/{id}: Issue a credential under schema `id`.
#[utoipa::path(
    post,
    path = "/v1/credentials/{id}",
    params(("id" = String, Path, description = "Schema id, e.g. schema:cord:kyc")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Credential anchored and stored", body = CredentialMutationResponse),
        (status = 400, description = "Invalid input or ledger declined", body = crate::error::ErrorBody),
        (status = 500, description = "Issuance fault", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn issue_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(schema_id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<CredentialMutationResponse>, AppError> {
    require_role(&caller, Role::Issuer)?;
    let payload = extract_json(body)?;

    let record = state.lifecycle.issue(&schema_id, payload).await?;

    Ok(Json(CredentialMutationResponse {
        result: "success".to_string(),
        identifier: record.identifier.clone(),
        credential: record.into(),
    }))
}

/// GET /v1/credentials/{id}: Read a credential record.
#[utoipa::path(
    get,
    path = "/v1/credentials/{id}",
    params(("id" = String, Path, description = "Current element URI")),
    responses(
        (status = 200, description = "Credential record", body = CredentialResponse),
        (status = 400, description = "No record holds the identifier (code NOT_FOUND)", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn get_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(identifier): Path<String>,
) -> Result<Json<CredentialResponse>, AppError> {
    require_role(&caller, Role::Reader)?;
    let record = state.lifecycle.get(&identifier).await?;
    Ok(Json(CredentialResponse {
        credential: record.into(),
    }))
}

/// PATCH /v1/credentials/{id}: Merge properties and re-anchor.
#[utoipa::path(
    patch,
    path = "/v1/credentials/{id}",
    params(("id" = String, Path, description = "Current element URI")),
    request_body = UpdateCredentialRequest,
    responses(
        (status = 200, description = "Credential updated; identifier is the new element URI", body = CredentialMutationResponse),
        (status = 400, description = "Invalid property, unknown identifier, or ledger declined", body = crate::error::ErrorBody),
        (status = 409, description = "Credential revoked or concurrently modified", body = crate::error::ErrorBody),
        (status = 500, description = "Update fault", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn update_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(identifier): Path<String>,
    body: Result<Json<UpdateCredentialRequest>, JsonRejection>,
) -> Result<Json<CredentialMutationResponse>, AppError> {
    require_role(&caller, Role::Issuer)?;
    let req = extract_json(body)?;

    let record = state.lifecycle.update(&identifier, &req.property).await?;

    Ok(Json(CredentialMutationResponse {
        result: "updated".to_string(),
        identifier: record.identifier.clone(),
        credential: record.into(),
    }))
}

/// DELETE /v1/credentials/{id}: Revoke a credential.
#[utoipa::path(
    delete,
    path = "/v1/credentials/{id}",
    params(("id" = String, Path, description = "Current element URI")),
    responses(
        (status = 200, description = "Credential revoked", body = RevokeResponse),
        (status = 400, description = "Unknown identifier or ledger declined", body = crate::error::ErrorBody),
        (status = 409, description = "Already revoked", body = crate::error::ErrorBody),
        (status = 500, description = "Revocation fault", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
async fn revoke_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(identifier): Path<String>,
) -> Result<Json<RevokeResponse>, AppError> {
    require_role(&caller, Role::Issuer)?;
    let record = state.lifecycle.revoke(&identifier).await?;
    Ok(Json(RevokeResponse {
        result: "revoked".to_string(),
        identifier: record.identifier,
    }))
}
