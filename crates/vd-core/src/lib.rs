#![deny(missing_docs)]

//! # vd-core: Foundational Types for the Verifiable-Document Service
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies: only `serde`, `serde_json`, `serde_jcs`, `thiserror`,
//! `chrono`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **[`CanonicalBytes`] is the sole path to fingerprint computation.** The
//!    credential hash anchored on the ledger and the bytes handed to signing
//!    callbacks both flow through `CanonicalBytes::new()`.
//!
//! 2. **Newtype wrappers for ledger identifiers.** A [`SpaceId`] cannot be
//!    passed where a [`SchemaId`] or [`AuthorizationId`] is expected, and each
//!    one validates its URI prefix at construction.
//!
//! 3. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_raw, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{AuthorizationId, Did, SchemaId, SpaceId};
pub use temporal::Timestamp;
