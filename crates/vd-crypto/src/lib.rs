//! # vd-crypto: Signing Keys for Ledger Dispatch
//!
//! Every ledger extrinsic the lifecycle manager submits is signed by one of
//! two authorities: the credential issuer (registration) or the registry
//! delegate (update and revocation). This crate provides:
//!
//! - **Ed25519** signing and verification over
//!   [`CanonicalBytes`](vd_core::CanonicalBytes) only.
//! - The [`KeyProvider`] abstraction so the service never holds a raw key
//!   outside a provider, with in-memory and environment-backed backends.

pub mod ed25519;
pub mod error;
pub mod key_provider;

pub use ed25519::{hex_to_bytes, Ed25519Signature, SigningKey, VerifyingKey};
pub use error::CryptoError;
pub use key_provider::{EnvKeyProvider, KeyProvider, KeyType, LocalKeyProvider, SignResponse};
