//! Order identifiers.
//!
//! Generated ids look like `ORD-3F9A12C0`: the prefix followed by the first
//! eight uppercase hex characters of a SHA-256 digest over a fresh UUIDv7.
//! Ids read back from storage or user input go through [`OrderId::parse`],
//! which guarantees they are safe to embed in artifact filenames.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{GatewayError, Result, constants};

/// Opaque, stable order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"govgate:order_id:v1:");
        hasher.update(Uuid::now_v7().as_bytes());
        let digest = hex::encode_upper(hasher.finalize());
        Self(format!(
            "{}{}",
            constants::ORDER_ID_PREFIX,
            &digest[..constants::ORDER_ID_HEX_LEN]
        ))
    }

    /// Validate an identifier received from outside.
    ///
    /// Accepts 1..=64 characters from `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(GatewayError::InvalidOrderId {
                reason: "empty".to_string(),
            });
        }
        if raw.len() > constants::MAX_ORDER_ID_LEN {
            return Err(GatewayError::InvalidOrderId {
                reason: format!("longer than {} characters", constants::MAX_ORDER_ID_LEN),
            });
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(GatewayError::InvalidOrderId {
                reason: format!("illegal character {bad:?}"),
            });
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_shape() {
        let id = OrderId::generate();
        let s = id.as_str();
        assert!(s.starts_with("ORD-"), "Got: {s}");
        assert_eq!(s.len(), 4 + constants::ORDER_ID_HEX_LEN);
        assert!(
            s[4..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn generated_ids_differ() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_id_reparses() {
        let id = OrderId::generate();
        assert_eq!(OrderId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn parse_rejects_path_tricks() {
        assert!(OrderId::parse("").is_err());
        assert!(OrderId::parse("../etc/passwd").is_err());
        assert!(OrderId::parse("ORD-1/2").is_err());
        assert!(OrderId::parse("ORD 1").is_err());
        assert!(OrderId::parse(&"A".repeat(65)).is_err());
        assert!(OrderId::parse("ORD-ABCDEF01").is_ok());
        assert!(OrderId::parse("legacy_order-7").is_ok());
    }

    #[test]
    fn serde_is_transparent() {
        let id = OrderId::parse("ORD-ABCDEF01").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ORD-ABCDEF01\"");
        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialize_validates() {
        let bad: std::result::Result<OrderId, _> = serde_json::from_str("\"a/b\"");
        assert!(bad.is_err());
    }
}
