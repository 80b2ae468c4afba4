//! Backoff for ledger gateway reads.
//!
//! Only the reads named by [`LedgerRead`] can be retried, and they are always
//! issued as `GET`. Signed dispatches have no `LedgerRead` form, so they
//! cannot reach this path.
//!
//! A read is retried when the transport fails or when the gateway answers
//! `502`/`504`, meaning its chain node was unreachable or too slow. Any other
//! status, including `503` from `/health`, is returned to the caller as is.

use std::time::Duration;

use vd_core::{Did, SpaceId};

use crate::error::LedgerError;

/// Backoff schedule for [`LedgerRead`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetry {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
}

impl ReadRetry {
    /// No retries at all.
    pub const NONE: Self = Self {
        max_retries: 0,
        base_delay: Duration::ZERO,
    };

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for ReadRetry {
    /// 200ms, 400ms, 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// An idempotent query against the ledger gateway.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LedgerRead<'a> {
    /// `GET /v1/spaces/{space}/delegates/{did}`
    DelegateLookup { space: &'a SpaceId, delegate: &'a Did },
    /// `GET /health`
    Health,
}

impl LedgerRead<'_> {
    pub(crate) fn path(&self) -> String {
        match self {
            Self::DelegateLookup { space, delegate } => {
                format!("/v1/spaces/{space}/delegates/{delegate}")
            }
            Self::Health => "/health".to_string(),
        }
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("GET {}", self.path())
    }
}

fn transient(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::BAD_GATEWAY || status == reqwest::StatusCode::GATEWAY_TIMEOUT
}

/// Issue `read` against `base`, backing off per `policy`.
///
/// Returns the last response once it is not transient or the retries are
/// spent. A transport failure on the final attempt becomes
/// [`LedgerError::Http`].
pub(crate) async fn send_read(
    http: &reqwest::Client,
    base: &str,
    read: LedgerRead<'_>,
    policy: ReadRetry,
) -> Result<reqwest::Response, LedgerError> {
    let endpoint = read.endpoint();
    let url = format!("{base}{}", read.path());
    let mut attempt = 0;
    loop {
        let outcome = http.get(&url).send().await;
        let retryable = match &outcome {
            Ok(resp) => transient(resp.status()),
            Err(_) => true,
        };
        if !retryable || attempt >= policy.max_retries {
            return outcome.map_err(|source| LedgerError::Http { endpoint, source });
        }

        let delay = policy.delay(attempt);
        match &outcome {
            Ok(resp) => tracing::warn!(
                %endpoint,
                status = resp.status().as_u16(),
                attempt = attempt + 1,
                max_retries = policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "ledger gateway read unavailable, backing off"
            ),
            Err(e) => tracing::warn!(
                %endpoint,
                error = %e,
                attempt = attempt + 1,
                max_retries = policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "ledger gateway unreachable, backing off"
            ),
        }
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(max_retries: u32) -> ReadRetry {
        ReadRetry {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn default_schedule_doubles() {
        let policy = ReadRetry::default();
        assert_eq!(policy.delay(0), Duration::from_millis(200));
        assert_eq!(policy.delay(1), Duration::from_millis(400));
        assert_eq!(policy.delay(2), Duration::from_millis(800));
    }

    #[test]
    fn delegate_lookup_path_names_space_and_did() {
        let space = SpaceId::new("space:cord:s1").unwrap();
        let delegate = Did::new("did:cord:d1").unwrap();
        let read = LedgerRead::DelegateLookup {
            space: &space,
            delegate: &delegate,
        };
        assert_eq!(read.endpoint(), "GET /v1/spaces/space:cord:s1/delegates/did:cord:d1");
        assert_eq!(LedgerRead::Health.endpoint(), "GET /health");
    }

    #[tokio::test]
    async fn unreachable_gateway_is_http_error_naming_endpoint() {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = send_read(&http, "http://127.0.0.1:1", LedgerRead::Health, fast(2))
            .await
            .unwrap_err();
        match err {
            LedgerError::Http { endpoint, .. } => assert_eq!(endpoint, "GET /health"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
