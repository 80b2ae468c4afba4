//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps lifecycle errors to HTTP status codes and JSON error bodies.
//! Fault messages are logged and never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use vd_credential::LifecycleError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ISSUANCE_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Which lifecycle operation a ledger outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Issue,
    Update,
    Revoke,
}

impl Operation {
    fn rejected_code(self) -> &'static str {
        match self {
            Self::Issue => "ISSUANCE_REJECTED",
            Self::Update => "UPDATE_REJECTED",
            Self::Revoke => "REVOKE_REJECTED",
        }
    }

    fn error_code(self) -> &'static str {
        match self {
            Self::Issue => "ISSUANCE_ERROR",
            Self::Update => "UPDATE_ERROR",
            Self::Revoke => "REVOKE_ERROR",
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// No record holds the identifier (400, code `NOT_FOUND`).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request parsed but its content is unusable (400).
    #[error("{0}")]
    InvalidArgument(String),

    /// Missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The credential is revoked (409).
    #[error("{0}")]
    Revoked(String),

    /// The ledger declined the dispatch (400).
    #[error("{message}")]
    Rejected {
        operation: Operation,
        message: String,
    },

    /// The dispatch faulted (500). Message is logged but not returned.
    #[error("{operation:?} failed: {detail}")]
    LedgerFault {
        operation: Operation,
        detail: String,
    },

    /// Ledger or store unreachable for a health probe (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::BAD_REQUEST, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Revoked(_) => (StatusCode::CONFLICT, "REVOKED"),
            Self::Rejected { operation, .. } => (StatusCode::BAD_REQUEST, operation.rejected_code()),
            Self::LedgerFault { operation, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, operation.error_code())
            }
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn is_hidden(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::LedgerFault { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::LedgerFault { operation, .. } => match operation {
                Operation::Issue => "Credential could not be issued".to_string(),
                Operation::Update => "Credential could not be updated".to_string(),
                Operation::Revoke => "Credential could not be revoked".to_string(),
            },
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if self.is_hidden() {
            tracing::error!(error = %self, code, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            LifecycleError::NotFound(id) => Self::NotFound(format!("credential {id}")),
            LifecycleError::Revoked(_) => Self::Revoked(message),
            LifecycleError::Conflict(_) => Self::Conflict(message),
            LifecycleError::IssuanceRejected => Self::Rejected {
                operation: Operation::Issue,
                message,
            },
            LifecycleError::UpdateRejected(_) => Self::Rejected {
                operation: Operation::Update,
                message,
            },
            LifecycleError::RevokeRejected(_) => Self::Rejected {
                operation: Operation::Revoke,
                message,
            },
            LifecycleError::IssuanceError(detail) => Self::LedgerFault {
                operation: Operation::Issue,
                detail,
            },
            LifecycleError::UpdateError(detail) => Self::LedgerFault {
                operation: Operation::Update,
                detail,
            },
            LifecycleError::RevokeError(detail) => Self::LedgerFault {
                operation: Operation::Revoke,
                detail,
            },
            LifecycleError::Storage(_) | LifecycleError::Initialization(_) => {
                Self::Internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_code(err: AppError) -> (StatusCode, &'static str) {
        err.status_and_code()
    }

    #[test]
    fn unknown_identifier_is_bad_request_with_not_found_code() {
        let (status, code) = status_code(AppError::NotFound("x".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn invalid_argument_is_bad_request() {
        let err: AppError = LifecycleError::InvalidArgument("bad".into()).into();
        assert_eq!(
            status_code(err),
            (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT")
        );
    }

    #[test]
    fn rejections_are_client_errors_with_operation_codes() {
        let cases = [
            (LifecycleError::IssuanceRejected, "ISSUANCE_REJECTED"),
            (LifecycleError::UpdateRejected("stmt:1".into()), "UPDATE_REJECTED"),
            (LifecycleError::RevokeRejected("stmt:1".into()), "REVOKE_REJECTED"),
        ];
        for (err, expected) in cases {
            let (status, code) = status_code(err.into());
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(code, expected);
        }
    }

    #[test]
    fn faults_are_server_errors_with_operation_codes() {
        let cases = [
            (LifecycleError::IssuanceError("x".into()), "ISSUANCE_ERROR"),
            (LifecycleError::UpdateError("x".into()), "UPDATE_ERROR"),
            (LifecycleError::RevokeError("x".into()), "REVOKE_ERROR"),
        ];
        for (err, expected) in cases {
            let (status, code) = status_code(err.into());
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(code, expected);
        }
    }

    #[test]
    fn revoked_and_conflict_are_409() {
        let (status, code) = status_code(LifecycleError::Revoked("stmt:1".into()).into());
        assert_eq!((status, code), (StatusCode::CONFLICT, "REVOKED"));
        let (status, code) = status_code(LifecycleError::Conflict("v".into()).into());
        assert_eq!((status, code), (StatusCode::CONFLICT, "CONFLICT"));
    }

    #[test]
    fn storage_maps_to_internal() {
        let (status, code) = status_code(LifecycleError::Storage("db down".into()).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn fault_body_hides_detail() {
        use http_body_util::BodyExt;

        let err: AppError = LifecycleError::IssuanceError("connection refused 10.0.0.5".into()).into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "ISSUANCE_ERROR");
        assert!(!body.error.message.contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn invalid_argument_body_carries_message() {
        use http_body_util::BodyExt;

        let msg = "\"property\" is a required field and should be an object";
        let err: AppError = LifecycleError::InvalidArgument(msg.into()).into();
        let resp = err.into_response();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.message, msg);
    }
}
