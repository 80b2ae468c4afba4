//! # Statements and Element URIs
//!
//! A statement anchors one credential digest in a space. Its element URI has
//! the form `stmt:<network>:<statement-id>:<digest-hex>`:
//!
//! - the statement id is fixed at registration and survives updates,
//! - the digest segment changes with every update,
//!
//! so the element URI changes on every successful update while revocation
//! (which does not touch the digest) leaves it stable.

use serde::{Deserialize, Serialize};

use vd_core::{sha256_raw, ContentDigest, Did, SchemaId, SpaceId};

use crate::error::LedgerError;

/// Network segment of every element URI this service produces.
pub const NETWORK: &str = "cord";

const URI_PREFIX: &str = "stmt:";

/// Parsed element URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementUri {
    /// Network segment (`cord`).
    pub network: String,
    /// Statement id, stable across updates.
    pub statement_id: String,
    /// Digest hex (no `0x`) of the content this element anchors.
    pub digest_hex: String,
}

impl ElementUri {
    /// Parse `stmt:<network>:<statement-id>:<digest-hex>`.
    pub fn parse(uri: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidStatementUri(uri.to_string());
        let rest = uri.strip_prefix(URI_PREFIX).ok_or_else(invalid)?;
        let mut parts = rest.splitn(3, ':');
        let network = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let statement_id = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let digest_hex = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        if digest_hex.contains(':') || !statement_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid());
        }
        Ok(Self {
            network: network.to_string(),
            statement_id: statement_id.to_string(),
            digest_hex: digest_hex.to_string(),
        })
    }
}

impl std::fmt::Display for ElementUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{URI_PREFIX}{}:{}:{}",
            self.network, self.statement_id, self.digest_hex
        )
    }
}

/// A statement prepared for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementEntry {
    /// Element URI this statement will occupy once accepted.
    pub element_uri: String,
    /// `0x`-prefixed credential digest.
    pub digest: String,
    /// DID of the authority creating this element.
    pub creator_uri: Did,
    /// Space the statement lives in.
    pub space_uri: SpaceId,
    /// Schema of the anchored credential. Absent on updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<SchemaId>,
}

impl StatementEntry {
    /// Build a registration statement for a new credential digest.
    ///
    /// The statement id is derived from the digest, space and creator, so
    /// registering the same content twice in a space yields the same id.
    pub fn from_properties(
        digest: &ContentDigest,
        space: &SpaceId,
        creator: &Did,
        schema: Option<&SchemaId>,
    ) -> Self {
        let seed = format!("{}|{}|{}", digest.to_prefixed_hex(), space, creator);
        let statement_id: String = sha256_raw(seed.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        let uri = ElementUri {
            network: NETWORK.to_string(),
            statement_id,
            digest_hex: digest.to_hex(),
        };
        Self {
            element_uri: uri.to_string(),
            digest: digest.to_prefixed_hex(),
            creator_uri: creator.clone(),
            space_uri: space.clone(),
            schema_uri: schema.cloned(),
        }
    }

    /// Build an update statement that re-points an existing element at a new
    /// digest, keeping its statement id.
    pub fn from_update_properties(
        prior_element_uri: &str,
        digest: &ContentDigest,
        space: &SpaceId,
        creator: &Did,
    ) -> Result<Self, LedgerError> {
        let prior = ElementUri::parse(prior_element_uri)?;
        let uri = ElementUri {
            digest_hex: digest.to_hex(),
            ..prior
        };
        Ok(Self {
            element_uri: uri.to_string(),
            digest: digest.to_prefixed_hex(),
            creator_uri: creator.clone(),
            space_uri: space.clone(),
            schema_uri: None,
        })
    }

    /// Statement id of this entry's element URI.
    pub fn statement_id(&self) -> Result<String, LedgerError> {
        ElementUri::parse(&self.element_uri).map(|u| u.statement_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did(s: &str) -> Did {
        Did::new(s).unwrap()
    }

    fn space() -> SpaceId {
        SpaceId::new("space:cord:s1").unwrap()
    }

    #[test]
    fn registration_uri_embeds_digest() {
        let digest = ContentDigest::sha256([0xab; 32]);
        let entry = StatementEntry::from_properties(
            &digest,
            &space(),
            &did("did:cord:issuer"),
            Some(&SchemaId::new("schema:cord:1").unwrap()),
        );
        let uri = ElementUri::parse(&entry.element_uri).unwrap();
        assert_eq!(uri.network, "cord");
        assert_eq!(uri.statement_id.len(), 64);
        assert_eq!(uri.digest_hex, "ab".repeat(32));
        assert_eq!(entry.digest, format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn registration_is_deterministic() {
        let digest = ContentDigest::sha256([1; 32]);
        let a = StatementEntry::from_properties(&digest, &space(), &did("did:cord:a"), None);
        let b = StatementEntry::from_properties(&digest, &space(), &did("did:cord:a"), None);
        let c = StatementEntry::from_properties(&digest, &space(), &did("did:cord:b"), None);
        assert_eq!(a, b);
        assert_ne!(a.element_uri, c.element_uri);
    }

    #[test]
    fn update_keeps_statement_id_and_changes_uri() {
        let first = StatementEntry::from_properties(
            &ContentDigest::sha256([1; 32]),
            &space(),
            &did("did:cord:issuer"),
            None,
        );
        let updated = StatementEntry::from_update_properties(
            &first.element_uri,
            &ContentDigest::sha256([2; 32]),
            &space(),
            &did("did:cord:delegate"),
        )
        .unwrap();
        assert_eq!(first.statement_id().unwrap(), updated.statement_id().unwrap());
        assert_ne!(first.element_uri, updated.element_uri);
        assert_eq!(updated.creator_uri.as_str(), "did:cord:delegate");
        assert!(updated.schema_uri.is_none());
    }

    #[test]
    fn update_from_malformed_uri_fails() {
        let err = StatementEntry::from_update_properties(
            "stmt:1",
            &ContentDigest::sha256([2; 32]),
            &space(),
            &did("did:cord:delegate"),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidStatementUri(_)));
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(ElementUri::parse("").is_err());
        assert!(ElementUri::parse("stmt:cord:abc").is_err());
        assert!(ElementUri::parse("stmt:cord::ff").is_err());
        assert!(ElementUri::parse("stmt:cord:ab-c:ff").is_err());
        assert!(ElementUri::parse("stmt:cord:abc:ff:extra").is_err());
        assert!(ElementUri::parse("stmt:cord:abc:ff").is_ok());
    }

    #[test]
    fn serializes_camel_case() {
        let entry = StatementEntry::from_properties(
            &ContentDigest::sha256([0; 32]),
            &space(),
            &did("did:cord:issuer"),
            None,
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("elementUri").is_some());
        assert!(json.get("creatorUri").is_some());
        assert!(json.get("schemaUri").is_none());
    }
}
