//! # API Route Modules
//!
//! - `credentials`: issue, read, update, and revoke credential records.

pub mod credentials;
