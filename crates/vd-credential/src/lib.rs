//! # vd-credential: Credential Lifecycle Manager
//!
//! Issues, updates, and revokes verifiable-credential records. The ledger is
//! authoritative; the [`CredentialStore`] holds a local mirror that is only
//! ever written after the ledger accepted the corresponding dispatch.
//!
//! ## Invariants
//!
//! - `cred_hash` is the fingerprint of `content` as of the last write.
//! - `identifier` changes only after an accepted issuance or update.
//! - `active` goes `true → false` once, after an accepted revocation.
//! - No record exists without an accepted issuance.

pub mod error;
pub mod lifecycle;
pub mod record;
pub mod store;

pub use error::LifecycleError;
pub use lifecycle::{fingerprint, Authorities, Authority, LifecycleManager};
pub use record::CredentialRecord;
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
