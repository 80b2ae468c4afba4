//! # OpenAPI Document Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Verifiable Document Lifecycle API",
        version = "0.1.0",
        description = "Issue, read, update, and revoke ledger-anchored verifiable credentials.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::credentials::issue_credential,
        crate::routes::credentials::get_credential,
        crate::routes::credentials::update_credential,
        crate::routes::credentials::revoke_credential,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::auth::Role,
        crate::routes::credentials::CredentialView,
        crate::routes::credentials::StatementEntryView,
        crate::routes::credentials::CredentialMutationResponse,
        crate::routes::credentials::CredentialResponse,
        crate::routes::credentials::UpdateCredentialRequest,
        crate::routes::credentials::RevokeResponse,
    )),
    tags(
        (name = "credentials", description = "Credential lifecycle"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
