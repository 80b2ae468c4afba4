//! # Prometheus Metrics
//!
//! Request metrics are recorded by [`metrics_middleware`] into a registry
//! owned by [`ApiMetrics`]. Dependency gauges (`vd_store_up`, `vd_ledger_up`)
//! are refreshed on each `/metrics` scrape, see the handler in `lib.rs`.
//!
//! The `path` label is the matched route template, so credential
//! identifiers never become label values.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Label used for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,
    store_up: Gauge,
    ledger_up: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("client_errors", &self.client_errors())
            .field("server_errors", &self.server_errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a metrics instance with its own registry.
    ///
    /// # Errors
    ///
    /// Fails only if a metric definition is invalid or registered twice.
    pub fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("vd_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "vd_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["method", "path"],
        )?;
        let http_errors_total = IntCounterVec::new(
            Opts::new("vd_http_errors_total", "HTTP responses with 4xx or 5xx status"),
            &["method", "path", "status"],
        )?;
        let store_up = Gauge::new("vd_store_up", "Credential store reachable (1) or not (0)")?;
        let ledger_up = Gauge::new("vd_ledger_up", "Ledger reachable (1) or not (0)")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;
        registry.register(Box::new(store_up.clone()))?;
        registry.register(Box::new(ledger_up.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                store_up,
                ledger_up,
            }),
        })
    }

    /// Total requests seen, across all labels.
    pub fn requests(&self) -> u64 {
        sum_counters(&self.inner.http_requests_total, |_| true)
    }

    /// Responses with a 4xx status.
    pub fn client_errors(&self) -> u64 {
        sum_counters(&self.inner.http_errors_total, |status| status.starts_with('4'))
    }

    /// Responses with a 5xx status.
    pub fn server_errors(&self) -> u64 {
        sum_counters(&self.inner.http_errors_total, |status| status.starts_with('5'))
    }

    /// Record the outcome of the last dependency checks.
    pub fn set_dependencies_up(&self, store_up: bool, ledger_up: bool) {
        self.inner.store_up.set(if store_up { 1.0 } else { 0.0 });
        self.inner.ledger_up.set(if ledger_up { 1.0 } else { 0.0 });
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Gather all metrics in Prometheus text exposition format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.inner.registry.gather(), &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

/// Sum an `IntCounterVec` over the series whose `status` label passes `keep`.
fn sum_counters(vec: &IntCounterVec, keep: impl Fn(&str) -> bool) -> u64 {
    let mut total = 0u64;
    for family in vec.collect() {
        for metric in family.get_metric() {
            let status = metric
                .get_label()
                .iter()
                .find(|l| l.get_name() == "status")
                .map(|l| l.get_value())
                .unwrap_or_default();
            if keep(status) {
                total += metric.get_counter().get_value() as u64;
            }
        }
    }
    total
}

/// Middleware that records request count, latency, and error status.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(
            &method,
            &path,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }

    response
}
