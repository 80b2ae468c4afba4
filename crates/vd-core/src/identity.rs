//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for the identifiers that cross the ledger
//! boundary. Each one validates its format at construction time and on
//! deserialization, so a malformed id is rejected at the edge instead of
//! being dispatched to the ledger.
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | [`Did`] | `did:<method>:<id>` | `did:cord:3xyz` |
//! | [`SpaceId`] | `space:<network>:<id>` | `space:cord:c35...` |
//! | [`SchemaId`] | `schema:<network>:<id>` | `schema:cord:1` |
//! | [`AuthorizationId`] | `auth:<network>:<id>` | `auth:cord:a3f...` |

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implement `Deserialize` for string newtypes by routing through `new()`,
/// so invalid values are rejected at deserialization time.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Define a `<prefix><network>:<id>` ledger URI newtype.
macro_rules! ledger_uri {
    ($(#[$meta:meta])* $ty:ident, $kind:literal, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $ty(String);

        impl_validating_deserialize!($ty);

        impl $ty {
            /// URI prefix every value of this type carries.
            pub const PREFIX: &'static str = $prefix;

            /// Create from a string, validating the URI format.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::InvalidIdentifier`] when the prefix,
            /// network, or id segment is missing, or the value contains whitespace.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if validate_ledger_uri(&s, $prefix) {
                    Ok(Self(s))
                } else {
                    Err(ValidationError::InvalidIdentifier {
                        kind: $kind,
                        prefix: $prefix,
                        value: s,
                    })
                }
            }

            /// Access the URI string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

fn validate_ledger_uri(s: &str, prefix: &str) -> bool {
    let Some(rest) = s.strip_prefix(prefix) else {
        return false;
    };
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    match rest.split_once(':') {
        Some((network, id)) => !network.is_empty() && !id.is_empty(),
        None => false,
    }
}

ledger_uri!(
    /// A ledger space (registry) the service anchors statements into.
    SpaceId,
    "space",
    "space:"
);

ledger_uri!(
    /// The schema a credential conforms to.
    SchemaId,
    "schema",
    "schema:"
);

ledger_uri!(
    /// An authorization granting a DID the right to write into a space.
    AuthorizationId,
    "authorization",
    "auth:"
);

/// W3C Decentralized Identifier (DID).
///
/// Format: `did:<method>:<method-specific-id>` where method is lowercase
/// alphanumeric and method-specific-id is non-empty.
///
/// Reference: <https://www.w3.org/TR/did-core/#did-syntax>
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Did(String);

impl_validating_deserialize!(Did);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not
    /// match the `did:method:identifier` format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = s
            .strip_prefix("did:")
            .and_then(|rest| rest.split_once(':'))
            .is_some_and(|(method, id)| {
                !method.is_empty()
                    && method
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                    && !id.is_empty()
            });
        if valid {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidDid(s))
        }
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the DID method (the part between the first and second colons).
    pub fn method(&self) -> &str {
        self.0[4..].split_once(':').map(|(m, _)| m).unwrap_or_default()
    }

    /// Return the method-specific identifier (everything after `did:method:`).
    pub fn method_specific_id(&self) -> &str {
        self.0[4..].split_once(':').map(|(_, id)| id).unwrap_or_default()
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
