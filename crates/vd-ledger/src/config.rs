//! Ledger gateway client configuration.

use url::Url;
use zeroize::Zeroizing;

/// Configuration for connecting to the ledger gateway.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct LedgerConfig {
    /// Gateway base URL.
    pub base_url: Url,
    /// Bearer token for the gateway. Empty means no `Authorization` header.
    pub api_token: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LedgerConfig {
    /// Default transport timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Build a configuration for an explicit gateway URL.
    pub fn new(base_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            base_url,
            api_token: Zeroizing::new(api_token.into()),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `Ok(None)` when `LEDGER_URL` is unset, meaning no gateway is
    /// configured.
    ///
    /// Variables:
    /// - `LEDGER_URL`
    /// - `LEDGER_API_TOKEN` (optional)
    /// - `LEDGER_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Ok(raw) = std::env::var("LEDGER_URL") else {
            return Ok(None);
        };
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("LEDGER_URL".to_string(), e.to_string()))?;

        Ok(Some(Self {
            base_url,
            api_token: Zeroizing::new(std::env::var("LEDGER_API_TOKEN").unwrap_or_default()),
            timeout_secs: parse_timeout(std::env::var("LEDGER_TIMEOUT_SECS").ok().as_deref())?,
        }))
    }

    /// Base URL without a trailing slash, for path formatting.
    pub(crate) fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

fn parse_timeout(raw: Option<&str>) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(LedgerConfig::DEFAULT_TIMEOUT_SECS),
        Some(s) => match s.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidTimeout(s.to_string())),
            Ok(n) => Ok(n),
        },
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL variable does not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// `LEDGER_TIMEOUT_SECS` is not a positive integer.
    #[error("LEDGER_TIMEOUT_SECS must be a positive integer, got \"{0}\"")]
    InvalidTimeout(String),
    /// The API token contains characters not allowed in a header.
    #[error("LEDGER_API_TOKEN is not a valid header value")]
    InvalidToken,
}
