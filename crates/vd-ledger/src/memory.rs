//! # In-Memory Ledger
//!
//! A ledger fake that enforces the same rules a real chain would: calls must
//! be signed by a registered authority, authorizations must match the space,
//! and revoked statements cannot be updated or revoked again. Rejections are
//! reported the way the gateway reports them (`None` / `false`).
//!
//! Used by tests and by the service in development mode when no gateway URL
//! is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;

use vd_core::{sha256_raw, AuthorizationId, Did, SpaceId};
use vd_crypto::{KeyProvider, VerifyingKey};

use crate::call::{AuthorAccount, CallKind, LedgerCall, SignedCall};
use crate::client::LedgerClient;
use crate::error::LedgerError;
use crate::statement::{ElementUri, StatementEntry};

/// Fault injection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultMode {
    /// Process calls normally.
    #[default]
    Healthy,
    /// Decline every dispatch.
    Reject,
    /// Fail every call with [`LedgerError::Unavailable`].
    Unavailable,
}

/// One dispatch seen by the ledger, accepted or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    /// Call kind.
    pub call: CallKind,
    /// DID that signed the call.
    pub signer: Did,
    /// Whether the ledger accepted it.
    pub accepted: bool,
}

#[derive(Debug)]
struct Space {
    authorization: AuthorizationId,
    owner: Did,
    delegates: HashMap<Did, AuthorizationId>,
}

#[derive(Debug)]
struct Statement {
    element_uri: String,
    space: SpaceId,
    revoked: bool,
}

#[derive(Default)]
struct State {
    authorities: HashMap<Did, VerifyingKey>,
    spaces: HashMap<SpaceId, Space>,
    statements: HashMap<String, Statement>,
    dispatches: Vec<DispatchRecord>,
    mode: FaultMode,
}

/// Signature-verifying in-memory ledger.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<State>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authority's public key.
    pub fn with_authority(self, did: Did, key: VerifyingKey) -> Self {
        self.state.write().authorities.insert(did, key);
        self
    }

    /// Create a space owned by `owner`, writable with `authorization`.
    pub fn with_space(self, space: SpaceId, authorization: AuthorizationId, owner: Did) -> Self {
        self.state.write().spaces.insert(
            space,
            Space {
                authorization,
                owner,
                delegates: HashMap::new(),
            },
        );
        self
    }

    /// Switch fault injection mode.
    pub fn set_fault_mode(&self, mode: FaultMode) {
        self.state.write().mode = mode;
    }

    /// Number of statement dispatches (register, update, revoke) received.
    pub fn dispatch_count(&self) -> usize {
        self.state
            .read()
            .dispatches
            .iter()
            .filter(|d| d.call != CallKind::AddDelegate)
            .count()
    }

    /// Every call received, in order.
    pub fn dispatches(&self) -> Vec<DispatchRecord> {
        self.state.read().dispatches.clone()
    }

    /// Whether the statement behind `element_uri` exists and is not revoked.
    pub fn is_active(&self, element_uri: &str) -> bool {
        let Ok(uri) = ElementUri::parse(element_uri) else {
            return false;
        };
        self.state
            .read()
            .statements
            .get(&uri.statement_id)
            .is_some_and(|s| !s.revoked && s.element_uri == element_uri)
    }

    /// Check signature and authorization the way the chain would.
    fn admit(state: &State, signed: &SignedCall, space: &SpaceId) -> Result<(), String> {
        let signer = &signed.call.signer;
        let key = state
            .authorities
            .get(signer)
            .ok_or_else(|| format!("unknown authority {signer}"))?;
        if !signed.verify(key) {
            return Err(format!("bad signature from {signer}"));
        }
        let entry = state
            .spaces
            .get(space)
            .ok_or_else(|| format!("unknown space {space}"))?;
        let authorized = match signed.call.call {
            CallKind::Register | CallKind::AddDelegate => {
                signed.call.authorization == entry.authorization && *signer == entry.owner
            }
            CallKind::Update | CallKind::Revoke => {
                entry.delegates.get(signer) == Some(&signed.call.authorization)
                    || (signed.call.authorization == entry.authorization
                        && *signer == entry.owner)
            }
        };
        if authorized {
            Ok(())
        } else {
            Err(format!(
                "{signer} not authorized in {space} by {}",
                signed.call.authorization
            ))
        }
    }

    fn check_mode(state: &State) -> Result<bool, LedgerError> {
        match state.mode {
            FaultMode::Healthy => Ok(true),
            FaultMode::Reject => Ok(false),
            FaultMode::Unavailable => Err(LedgerError::Unavailable(
                "in-memory ledger switched off".into(),
            )),
        }
    }

    fn record(state: &mut State, signed: &SignedCall, accepted: bool) {
        state.dispatches.push(DispatchRecord {
            call: signed.call.call,
            signer: signed.call.signer.clone(),
            accepted,
        });
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
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
        let statement_id = entry.statement_id()?;

        let mut state = self.state.write();
        let outcome = match Self::check_mode(&state) {
            Ok(true) => Self::admit(&state, &signed, &entry.space_uri)
                .and_then(|()| match state.statements.get(&statement_id) {
                    Some(_) => Err(format!("statement {statement_id} already anchored")),
                    None => Ok(()),
                }),
            Ok(false) => Err("fault mode: reject".to_string()),
            Err(e) => {
                Self::record(&mut state, &signed, false);
                return Err(e);
            }
        };
        let accepted = outcome.is_ok();
        Self::record(&mut state, &signed, accepted);
        match outcome {
            Ok(()) => {
                state.statements.insert(
                    statement_id,
                    Statement {
                        element_uri: entry.element_uri.clone(),
                        space: entry.space_uri.clone(),
                        revoked: false,
                    },
                );
                Ok(Some(entry.element_uri.clone()))
            }
            Err(reason) => {
                tracing::debug!(%reason, "in-memory ledger declined registration");
                Ok(None)
            }
        }
    }

    async fn dispatch_update(
        &self,
        entry: &StatementEntry,
        delegate: &Did,
        author: &AuthorAccount,
        authorization: &AuthorizationId,
        signer: &dyn KeyProvider,
    ) -> Result<Option<String>, LedgerError> {
        let signed = LedgerCall {
            call: CallKind::Update,
            author: author.clone(),
            authorization: authorization.clone(),
            signer: delegate.clone(),
            payload: serde_json::to_value(entry).map_err(vd_core::CanonicalizationError::from)?,
        }
        .sign(signer)?;
        let statement_id = entry.statement_id()?;

        let mut state = self.state.write();
        let outcome = match Self::check_mode(&state) {
            Ok(true) => Self::admit(&state, &signed, &entry.space_uri).and_then(|()| {
                match state.statements.get(&statement_id) {
                    Some(s) if s.revoked => Err(format!("statement {statement_id} revoked")),
                    Some(s) if s.space != entry.space_uri => {
                        Err(format!("statement {statement_id} not in {}", entry.space_uri))
                    }
                    Some(_) => Ok(()),
                    None => Err(format!("statement {statement_id} not found")),
                }
            }),
            Ok(false) => Err("fault mode: reject".to_string()),
            Err(e) => {
                Self::record(&mut state, &signed, false);
                return Err(e);
            }
        };
        let accepted = outcome.is_ok();
        Self::record(&mut state, &signed, accepted);
        match outcome {
            Ok(()) => {
                if let Some(s) = state.statements.get_mut(&statement_id) {
                    s.element_uri = entry.element_uri.clone();
                }
                Ok(Some(entry.element_uri.clone()))
            }
            Err(reason) => {
                tracing::debug!(%reason, "in-memory ledger declined update");
                Ok(None)
            }
        }
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

        let mut state = self.state.write();
        let outcome = match Self::check_mode(&state) {
            Ok(true) => match state.statements.get(&statement_id) {
                None => Err(format!("statement {statement_id} not found")),
                Some(s) if s.revoked => Err(format!("statement {statement_id} already revoked")),
                Some(s) if s.element_uri != element_uri => {
                    Err(format!("{element_uri} is not the current element"))
                }
                Some(s) => {
                    let space = s.space.clone();
                    Self::admit(&state, &signed, &space)
                }
            },
            Ok(false) => Err("fault mode: reject".to_string()),
            Err(e) => {
                Self::record(&mut state, &signed, false);
                return Err(e);
            }
        };
        let accepted = outcome.is_ok();
        Self::record(&mut state, &signed, accepted);
        match outcome {
            Ok(()) => {
                if let Some(s) = state.statements.get_mut(&statement_id) {
                    s.revoked = true;
                }
                Ok(true)
            }
            Err(reason) => {
                tracing::debug!(%reason, "in-memory ledger declined revocation");
                Ok(false)
            }
        }
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
        let signed = LedgerCall {
            call: CallKind::AddDelegate,
            author: author.clone(),
            authorization: space_authorization.clone(),
            signer: issuer.clone(),
            payload: json!({ "space": space, "delegate": delegate }),
        }
        .sign(issuer_signer)?;

        let mut state = self.state.write();
        if state.mode == FaultMode::Unavailable {
            return Err(LedgerError::Unavailable(
                "in-memory ledger switched off".into(),
            ));
        }
        if let Some(existing) = state
            .spaces
            .get(space)
            .and_then(|s| s.delegates.get(delegate))
        {
            return Ok(existing.clone());
        }
        if let Err(reason) = Self::admit(&state, &signed, space) {
            Self::record(&mut state, &signed, false);
            return Err(LedgerError::Rejected {
                call: CallKind::AddDelegate.as_str(),
                reason,
            });
        }

        let seed = format!("{space}|{delegate}");
        let hex: String = sha256_raw(seed.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        let authorization = AuthorizationId::new(format!("auth:cord:{hex}"))
            .map_err(|e| LedgerError::Rejected {
                call: CallKind::AddDelegate.as_str(),
                reason: e.to_string(),
            })?;
        Self::record(&mut state, &signed, true);
        if let Some(entry) = state.spaces.get_mut(space) {
            entry
                .delegates
                .insert(delegate.clone(), authorization.clone());
        }
        Ok(authorization)
    }

    async fn health(&self) -> Result<(), LedgerError> {
        match self.state.read().mode {
            FaultMode::Unavailable => Err(LedgerError::Unavailable(
                "in-memory ledger switched off".into(),
            )),
            _ => Ok(()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
