//! # Service Bootstrap
//!
//! Builds the lifecycle manager from the environment before the server
//! starts accepting requests.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Select Ledger**: `LEDGER_URL` set means the HTTP gateway;
//!    unset means development mode with an in-memory ledger.
//! 2. **Load Authorities**: DIDs, space, author account and signing seeds.
//!    In development mode missing values fall back to defaults and
//!    ephemeral keys. Against a real ledger every value is required.
//! 3. **Select Store**: Postgres when a pool is available, else in-memory.
//! 4. **Initialize**: register the delegate in the space.

use std::sync::Arc;

use sqlx::PgPool;
use zeroize::Zeroizing;

use vd_core::{AuthorizationId, Did, SpaceId};
use vd_credential::{
    Authorities, Authority, CredentialStore, InMemoryCredentialStore, LifecycleError,
    LifecycleManager,
};
use vd_crypto::{CryptoError, EnvKeyProvider, KeyProvider, LocalKeyProvider};
use vd_ledger::{
    AuthorAccount, ConfigError, HttpLedgerClient, InMemoryLedger, LedgerClient, LedgerConfig,
    LedgerError,
};

use crate::db::PgCredentialStore;
use crate::state::{AppConfig, AppState};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during service bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// A variable required against a real ledger is unset.
    #[error("{0} must be set when LEDGER_URL is configured")]
    MissingVar(&'static str),

    /// A variable is set but does not parse.
    #[error("invalid {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    /// A signing seed could not be loaded.
    #[error("signing key {var}: {source}")]
    SigningKey {
        var: &'static str,
        #[source]
        source: CryptoError,
    },

    /// Ledger gateway configuration is invalid.
    #[error("ledger configuration: {0}")]
    LedgerConfig(#[from] ConfigError),

    /// The ledger client could not be constructed.
    #[error("ledger client: {0}")]
    Ledger(#[from] LedgerError),

    /// Delegate registration failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

// ---------------------------------------------------------------------------
// Environment variables and development defaults
// ---------------------------------------------------------------------------

const SPACE_VAR: &str = "CHAIN_SPACE_ID";
const SPACE_AUTH_VAR: &str = "CHAIN_SPACE_AUTH";
const ISSUER_DID_VAR: &str = "ISSUER_DID";
const ISSUER_SEED_VAR: &str = "ISSUER_SEED_HEX";
const DELEGATE_DID_VAR: &str = "DELEGATE_DID";
const DELEGATE_SEED_VAR: &str = "DELEGATE_SEED_HEX";
const AUTHOR_VAR: &str = "AUTHOR_ADDRESS";

const DEV_SPACE: &str = "space:cord:dev-registry";
const DEV_SPACE_AUTH: &str = "auth:cord:dev-owner";
const DEV_ISSUER_DID: &str = "did:cord:dev-issuer";
const DEV_DELEGATE_DID: &str = "did:cord:dev-delegate";
const DEV_AUTHOR: &str = "5DevAuthorAccount";

/// Authorities loaded for the service.
#[derive(Debug)]
pub struct LoadedAuthorities {
    pub authorities: Authorities,
    /// Whether any signing key was generated for this process only.
    pub ephemeral_keys: bool,
}

/// Resolve authorities through `lookup`.
///
/// `dev_mode` enables defaults for missing values. Outside development
/// mode every variable must be present.
pub fn load_authorities(
    lookup: &dyn Fn(&str) -> Option<String>,
    dev_mode: bool,
) -> Result<LoadedAuthorities, BootstrapError> {
    let var = |name: &'static str, default: &str| -> Result<String, BootstrapError> {
        match lookup(name).filter(|v| !v.is_empty()) {
            Some(value) => Ok(value),
            None if dev_mode => Ok(default.to_string()),
            None => Err(BootstrapError::MissingVar(name)),
        }
    };

    let space = SpaceId::new(var(SPACE_VAR, DEV_SPACE)?).map_err(|e| invalid(SPACE_VAR, e))?;
    let space_authorization = AuthorizationId::new(var(SPACE_AUTH_VAR, DEV_SPACE_AUTH)?)
        .map_err(|e| invalid(SPACE_AUTH_VAR, e))?;
    let issuer_did =
        Did::new(var(ISSUER_DID_VAR, DEV_ISSUER_DID)?).map_err(|e| invalid(ISSUER_DID_VAR, e))?;
    let delegate_did = Did::new(var(DELEGATE_DID_VAR, DEV_DELEGATE_DID)?)
        .map_err(|e| invalid(DELEGATE_DID_VAR, e))?;
    let author =
        AuthorAccount::new(var(AUTHOR_VAR, DEV_AUTHOR)?).map_err(|e| invalid(AUTHOR_VAR, e))?;

    let (issuer_key, issuer_ephemeral) = load_key(lookup, ISSUER_SEED_VAR, dev_mode)?;
    let (delegate_key, delegate_ephemeral) = load_key(lookup, DELEGATE_SEED_VAR, dev_mode)?;

    Ok(LoadedAuthorities {
        authorities: Authorities {
            issuer: Authority {
                did: issuer_did,
                key: issuer_key,
            },
            delegate: Authority {
                did: delegate_did,
                key: delegate_key,
            },
            author,
            space,
            space_authorization,
        },
        ephemeral_keys: issuer_ephemeral || delegate_ephemeral,
    })
}

fn invalid(var: &'static str, err: impl std::fmt::Display) -> BootstrapError {
    BootstrapError::InvalidVar {
        var,
        reason: err.to_string(),
    }
}

fn load_key(
    lookup: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
    dev_mode: bool,
) -> Result<(Arc<dyn KeyProvider>, bool), BootstrapError> {
    match lookup(var).map(Zeroizing::new) {
        Some(hex) => {
            let provider = EnvKeyProvider::from_hex_seed(var, hex.trim())
                .map_err(|source| BootstrapError::SigningKey { var, source })?;
            Ok((Arc::new(provider), false))
        }
        None if dev_mode => {
            tracing::warn!(var, "signing seed not set, generating ephemeral key");
            Ok((Arc::new(LocalKeyProvider::generate()), true))
        }
        None => Err(BootstrapError::MissingVar(var)),
    }
}

/// In-memory ledger pre-seeded with the authorities and their space.
pub fn development_ledger(authorities: &Authorities) -> Result<InMemoryLedger, BootstrapError> {
    let issuer_key = authorities
        .issuer
        .key
        .verifying_key()
        .map_err(|source| BootstrapError::SigningKey {
            var: ISSUER_SEED_VAR,
            source,
        })?;
    let delegate_key = authorities
        .delegate
        .key
        .verifying_key()
        .map_err(|source| BootstrapError::SigningKey {
            var: DELEGATE_SEED_VAR,
            source,
        })?;

    Ok(InMemoryLedger::new()
        .with_authority(authorities.issuer.did.clone(), issuer_key)
        .with_authority(authorities.delegate.did.clone(), delegate_key)
        .with_space(
            authorities.space.clone(),
            authorities.space_authorization.clone(),
            authorities.issuer.did.clone(),
        ))
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Build the application state from the process environment.
pub async fn bootstrap(
    config: AppConfig,
    db_pool: Option<PgPool>,
) -> Result<AppState, BootstrapError> {
    let ledger_config = LedgerConfig::from_env()?;
    let dev_mode = ledger_config.is_none();

    let loaded = load_authorities(&|name| std::env::var(name).ok(), dev_mode)?;
    if loaded.ephemeral_keys {
        tracing::warn!("using ephemeral signing keys; anchored credentials will not verify after restart");
    }

    let ledger: Arc<dyn LedgerClient> = match ledger_config {
        Some(cfg) => {
            tracing::info!(url = %cfg.base_url, "using ledger gateway");
            Arc::new(HttpLedgerClient::new(cfg)?)
        }
        None => {
            tracing::warn!("LEDGER_URL not set, using in-memory ledger (development mode)");
            Arc::new(development_ledger(&loaded.authorities)?)
        }
    };

    let store: Arc<dyn CredentialStore> = match db_pool {
        Some(pool) => Arc::new(PgCredentialStore::new(pool)),
        None => Arc::new(InMemoryCredentialStore::new()),
    };

    let lifecycle = LifecycleManager::initialize(ledger, store, loaded.authorities).await?;

    tracing::info!(
        port = config.port,
        auth = config.auth_token.is_some(),
        "bootstrap complete"
    );

    Ok(AppState::new(config, Arc::new(lifecycle)))
}
