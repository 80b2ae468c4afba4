//! # vd-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the credential lifecycle API.
//! Binds to configurable port (default 8080).

use vd_api::state::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env();
    let port = config.port;
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set, authentication disabled");
    }
    if !config.metrics_enabled {
        tracing::info!("METRICS_ENABLED=false, /metrics not mounted");
    }

    // Optional: absent means in-memory store.
    let db_pool = vd_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = vd_api::bootstrap::bootstrap(config, db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Bootstrap failed: {e}");
            e
        })?;

    let app = vd_api::app(state)?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("VD API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
