//! # vd-ledger: Statement Anchoring on the Credential Ledger
//!
//! The ledger is the source of truth for whether a credential exists, what
//! its current digest is, and whether it has been revoked. This crate is the
//! only path from the service to the ledger.
//!
//! - [`StatementEntry`]: the statement anchored for a credential digest,
//!   identified by its element URI (`stmt:cord:<statement-id>:<digest>`).
//! - [`LedgerCall`] / [`SignedCall`]: the canonical call envelope and the
//!   authority signature over it.
//! - [`LedgerClient`]: the async interface the lifecycle manager drives.
//! - [`HttpLedgerClient`]: production backend talking to a ledger gateway.
//! - [`InMemoryLedger`]: signature-verifying fake for tests and development.
//!
//! ## Retry Policy
//!
//! Dispatches are never retried: a registration whose response was lost may
//! have been included on chain, and a blind retry would anchor it twice.
//! Only the idempotent reads (delegate lookup, health) back off and retry,
//! on a schedule set by [`ReadRetry`].

pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub(crate) mod retry;
pub mod statement;

pub use call::{AuthorAccount, CallKind, LedgerCall, SignedCall};
pub use client::LedgerClient;
pub use config::{ConfigError, LedgerConfig};
pub use error::LedgerError;
pub use http::HttpLedgerClient;
pub use retry::ReadRetry;
pub use memory::{DispatchRecord, FaultMode, InMemoryLedger};
pub use statement::{ElementUri, StatementEntry};
