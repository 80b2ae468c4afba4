//! # vd-api: HTTP Service for the Verifiable Document Lifecycle
//!
//! Exposes [`vd_credential::LifecycleManager`] over HTTP. Handlers stay
//! thin: all ledger and persistence rules live in the lifecycle crate.
//!
//! ## API Surface
//!
//! | Method | Path                    | Operation |
//! |--------|-------------------------|-----------|
//! | POST   | `/v1/credentials/{id}`  | Issue under schema `id` |
//! | GET    | `/v1/credentials/{id}`  | Read |
//! | PATCH  | `/v1/credentials/{id}`  | Update |
//! | DELETE | `/v1/credentials/{id}`  | Revoke |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → BodyLimit → Handler
//! ```
//!
//! Health probes at `/health/*` and the Prometheus scrape endpoint at
//! `/metrics` are mounted outside this stack, so they need no credentials.

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::Extension;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Assemble the full application router with a fresh metrics registry.
pub fn app(state: AppState) -> Result<Router, prometheus::Error> {
    Ok(app_with_metrics(state, ApiMetrics::try_new()?))
}

/// Assemble the router, recording into `metrics`.
///
/// When `config.metrics_enabled` is false neither the middleware nor the
/// `/metrics` route is mounted.
pub fn app_with_metrics(state: AppState, metrics: ApiMetrics) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics_on = state.config.metrics_enabled;

    let mut api = Router::new()
        .merge(routes::credentials::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(auth::auth_middleware));

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .layer(Extension(auth_config))
        .with_state(state.clone());

    let mut unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if metrics_on {
        unauthenticated = unauthenticated
            .route("/metrics", get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    Router::new()
        .merge(unauthenticated.with_state(state))
        .merge(api)
}

/// GET /metrics: Prometheus scrape endpoint.
///
/// Refreshes the dependency gauges, then encodes the registry.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    let store_up = state.lifecycle.store().ping().await.is_ok();
    let ledger_up = state.lifecycle.ledger().health().await.is_ok();
    metrics.set_dependencies_up(store_up, ledger_up);

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 when both the store and the ledger respond.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.lifecycle.store().ping().await {
        tracing::warn!(error = %e, "store health check failed");
        return (StatusCode::SERVICE_UNAVAILABLE, "store unreachable").into_response();
    }

    if let Err(e) = state.lifecycle.ledger().health().await {
        let msg = format!("ledger unreachable: {e}");
        tracing::warn!("{}", msg);
        return (StatusCode::SERVICE_UNAVAILABLE, msg).into_response();
    }

    "ready".into_response()
}
