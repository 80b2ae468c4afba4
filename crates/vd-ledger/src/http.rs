//! # HTTP Ledger Gateway Client
//!
//! Talks to a ledger gateway that accepts signed call envelopes and relays
//! them on chain.
//!
//! | Method | Path | Call |
//! |--------|------|------|
//! | POST | `/v1/statements` | register |
//! | PUT  | `/v1/statements/{statementId}` | update |
//! | POST | `/v1/statements/{statementId}/revoke` | revoke |
//! | GET  | `/v1/spaces/{space}/delegates/{did}` | delegate lookup |
//! | POST | `/v1/spaces/{space}/delegates` | add delegate |
//! | GET  | `/health` | probe |
//!
//! The gateway answers `409 Conflict` or `422 Unprocessable Entity` when the
//! chain declined an extrinsic; those map to rejections. A 2xx with a null or
//! empty `elementUri` is also a rejection.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use vd_core::{AuthorizationId, Did, SpaceId};
use vd_crypto::KeyProvider;

use crate::call::{AuthorAccount, CallKind, LedgerCall, SignedCall};
use crate::client::LedgerClient;
use crate::config::{ConfigError, LedgerConfig};
use crate::error::LedgerError;
use crate::retry::{send_read, LedgerRead, ReadRetry};
use crate::statement::{ElementUri, StatementEntry};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DispatchReceipt {
    #[serde(default)]
    element_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevokeReceipt {
    #[serde(default)]
    revoked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DelegateReceipt {
    authorization: AuthorizationId,
}

/// Ledger client backed by an HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    config: LedgerConfig,
    read_retry: ReadRetry,
}

impl HttpLedgerClient {
    /// Create a client from configuration.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if !config.api_token.is_empty() {
            let value = reqwest::header::HeaderValue::from_str(&format!(
                "Bearer {}",
                config.api_token.as_str()
            ))
            .map_err(|_| ConfigError::InvalidToken)?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| LedgerError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            config,
            read_retry: ReadRetry::default(),
        })
    }

    /// Replace the backoff schedule used for delegate lookups and health
    /// checks.
    pub fn with_read_retry(mut self, read_retry: ReadRetry) -> Self {
        self.read_retry = read_retry;
        self
    }

    /// Submit a signed call; `Ok(None)` when the gateway reports a declined
    /// extrinsic.
    async fn submit(
        &self,
        method: reqwest::Method,
        path: &str,
        signed: &SignedCall,
    ) -> Result<Option<reqwest::Response>, LedgerError> {
        let endpoint = format!("{method} {path}");
        let url = format!("{}{path}", self.config.base());

        let resp = self
            .http
            .request(method, &url)
            .json(signed)
            .send()
            .await
            .map_err(|e| LedgerError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%endpoint, status = status.as_u16(), %body, "ledger declined call");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Api {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(resp))
    }

    async fn submit_statement(
        &self,
        method: reqwest::Method,
        path: &str,
        signed: &SignedCall,
    ) -> Result<Option<String>, LedgerError> {
        let endpoint = format!("{method} {path}");
        let Some(resp) = self.submit(method, path, signed).await? else {
            return Ok(None);
        };
        let receipt: DispatchReceipt = resp
            .json()
            .await
            .map_err(|e| LedgerError::Deserialization { endpoint, source: e })?;
        Ok(receipt.element_uri.filter(|uri| !uri.is_empty()))
    }

    async fn lookup_delegate(
        &self,
        space: &SpaceId,
        delegate: &Did,
    ) -> Result<Option<AuthorizationId>, LedgerError> {
        let read = LedgerRead::DelegateLookup { space, delegate };
        let endpoint = read.endpoint();
        let resp = send_read(&self.http, self.config.base(), read, self.read_retry).await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Api {
                endpoint,
                status,
                body,
            });
        }
        let receipt: DelegateReceipt = resp
            .json()
            .await
            .map_err(|e| LedgerError::Deserialization { endpoint, source: e })?;
        Ok(Some(receipt.authorization))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn dispatch_issuance(
        &self,
        entry: &StatementEntry,
        issuer: &Did,
        author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<Option<String>, LedgerError> {
        let signed = LedgerCall {
            call: CallKind::Register,
            author: author.clone(),
            authorization: authorization.clone(),
            signer: issuer.clone(),
            payload: serde_json::to_value(entry).map_err(vd_core::CanonicalizationError::from)?,
        }
        .sign(signer)?;
        self.submit_statement(reqwest::Method::POST, "/v1/statements", &signed)
            .await
    }

    async fn dispatch_update(
        &self,
        entry: &StatementEntry,
        delegate: &Did,
        author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<Option<String>, LedgerError> {
        let statement_id = entry.statement_id()?;
        let signed = LedgerCall {
            call: CallKind::Update,
            author: author.clone(),
            authorization: authorization.clone(),
            signer: delegate.clone(),
            payload: serde_json::to_value(entry).map_err(vd_core::CanonicalizationError::from)?,
        }
        .sign(signer)?;
        let path = format!("/v1/statements/{statement_id}");
        self.submit_statement(reqwest::Method::PUT, &path, &signed)
            .await
    }

    async fn dispatch_revoke(
        &self,
        element_uri: &str,
        delegate: &Did,
        author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<bool, LedgerError> {
        let statement_id = ElementUri::parse(element_uri)?.statement_id;
        let signed = LedgerCall {
            call: CallKind::Revoke,
            author: author.clone(),
            authorization: authorization.clone(),
            signer: delegate.clone(),
            payload: json!({ "elementUri": element_uri }),
        }
        .sign(signer)?;
        let path = format!("/v1/statements/{statement_id}/revoke");
        let endpoint = format!("POST {path}");
        let Some(resp) = self.submit(reqwest::Method::POST, &path, &signed).await? else {
            return Ok(false);
        };
        let receipt: RevokeReceipt = resp
            .json()
            .await
            .map_err(|e| LedgerError::Deserialization { endpoint, source: e })?;
        Ok(receipt.revoked)
    }

    async fn ensure_delegate(
        &self,
        space: &SpaceId,
        space_authorization: &AuthorizationId,
        delegate: &Did,
        issuer: &Did,
        author: &AuthorAccount,
        issuer_signer: &dyn KeyProvider,
    ) -> Result<AuthorizationId, LedgerError> {
        if let Some(existing) = self.lookup_delegate(space, delegate).await? {
            tracing::debug!(%space, %delegate, authorization = %existing, "delegate already registered");
            return Ok(existing);
        }

        let signed = LedgerCall {
            call: CallKind::AddDelegate,
            author: author.clone(),
            authorization: space_authorization.clone(),
            signer: issuer.clone(),
            payload: json!({ "space": space, "delegate": delegate }),
        }
        .sign(issuer_signer)?;
        let path = format!("/v1/spaces/{space}/delegates");
        let endpoint = format!("POST {path}");
        let Some(resp) = self.submit(reqwest::Method::POST, &path, &signed).await? else {
            return Err(LedgerError::Rejected {
                call: CallKind::AddDelegate.as_str(),
                reason: format!("gateway declined delegate {delegate} in {space}"),
            });
        };
        let receipt: DelegateReceipt = resp
            .json()
            .await
            .map_err(|e| LedgerError::Deserialization { endpoint, source: e })?;
        tracing::info!(%space, %delegate, authorization = %receipt.authorization, "registered space delegate");
        Ok(receipt.authorization)
    }

    async fn health(&self) -> Result<(), LedgerError> {
        let read = LedgerRead::Health;
        let endpoint = read.endpoint();
        let resp = send_read(&self.http, self.config.base(), read, self.read_retry).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(LedgerError::Unavailable(format!(
                "{endpoint} returned {}",
                resp.status().as_u16()
            )))
        }
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
