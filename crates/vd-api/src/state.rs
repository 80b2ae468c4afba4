//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Credential records are not held here: they
//! live behind the lifecycle manager's store.

use std::sync::Arc;

use vd_credential::LifecycleManager;

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Record request metrics and serve `/metrics`.
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Read `PORT` (default 8080), `AUTH_TOKEN` (optional) and
    /// `METRICS_ENABLED` (on unless set to `false`).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let auth_token = std::env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty());
        let metrics_enabled = metrics_enabled(std::env::var("METRICS_ENABLED").ok().as_deref());
        Self {
            port,
            auth_token,
            metrics_enabled,
        }
    }
}

fn metrics_enabled(raw: Option<&str>) -> bool {
    raw.map(|v| !v.trim().eq_ignore_ascii_case("false"))
        .unwrap_or(true)
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: AppConfig,
    /// The credential lifecycle manager. Owns the ledger client and store.
    pub lifecycle: Arc<LifecycleManager>,
}

impl AppState {
    /// Build state around an initialized lifecycle manager.
    pub fn new(config: AppConfig, lifecycle: Arc<LifecycleManager>) -> Self {
        Self { config, lifecycle }
    }
}
