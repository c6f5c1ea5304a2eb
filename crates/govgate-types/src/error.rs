//! Error types for the GovGate compliance gateway.
//!
//! All errors use the `GG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order / intake errors
//! - 2xx: Canonical encoding errors
//! - 3xx: Integrity errors
//! - 4xx: Storage errors
//! - 9xx: Configuration / internal errors

use thiserror::Error;

use crate::OrderId;

/// Central error enum for all GovGate operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    // =================================================================
    // Order / Intake Errors (1xx)
    // =================================================================
    /// No order record exists for this id.
    #[error("GG_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The string is not a usable order identifier.
    #[error("GG_ERR_101: Invalid order id: {reason}")]
    InvalidOrderId { reason: String },

    /// The uploaded document was rejected by intake.
    #[error("GG_ERR_102: Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// A stored record violates `finalized <=> packet present`.
    #[error("GG_ERR_103: Inconsistent order record {order_id}: {reason}")]
    InconsistentRecord { order_id: OrderId, reason: String },

    // =================================================================
    // Encoding Errors (2xx)
    // =================================================================
    /// The value has no canonical form (non-finite float, non-string key, ...).
    #[error("GG_ERR_200: Canonical encoding failed: {reason}")]
    Encoding { reason: String },

    // =================================================================
    // Integrity Errors (3xx)
    // =================================================================
    /// Recomputed digest or MAC does not match the stored value.
    ///
    /// Only the stored value is carried; a recomputed MAC is never echoed.
    #[error("GG_ERR_300: Integrity mismatch on {field} (stored {stored})")]
    IntegrityMismatch { field: &'static str, stored: String },

    /// A stored hash or signature is not valid hex of the right length.
    #[error("GG_ERR_301: Malformed {field}: {reason}")]
    MalformedDigest { field: &'static str, reason: String },

    // =================================================================
    // Storage Errors (4xx)
    // =================================================================
    /// An artifact or store write did not complete.
    #[error("GG_ERR_400: Storage failure at {path}: {reason}")]
    Storage { path: String, reason: String },

    /// I/O error (disk).
    #[error("GG_ERR_401: I/O error: {0}")]
    Io(String),

    // =================================================================
    // Configuration / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("GG_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("GG_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (empty roster, missing secret, ...). Fatal at startup.
    #[error("GG_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Build a [`GatewayError::Storage`] for a path.
    pub fn storage(path: impl AsRef<std::path::Path>, reason: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error belongs to the storage class (write/read did not complete).
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Io(_))
    }

    /// Whether this error signals tampering or an encoder bug.
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::IntegrityMismatch { .. } | Self::MalformedDigest { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GatewayError>;

// Conversion from std::io::Error
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = GatewayError::OrderNotFound(OrderId::parse("ORD-ABCDEF01").unwrap());
        let msg = format!("{err}");
        assert!(msg.starts_with("GG_ERR_100"), "Got: {msg}");
        assert!(msg.contains("ORD-ABCDEF01"));
    }

    #[test]
    fn integrity_mismatch_display() {
        let err = GatewayError::IntegrityMismatch {
            field: "packet_hash",
            stored: "aa".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("GG_ERR_300"));
        assert!(msg.contains("packet_hash"));
        assert!(err.is_integrity());
        assert!(!err.is_storage());
    }

    #[test]
    fn io_errors_are_storage_class() {
        let err: GatewayError = std::io::Error::other("disk full").into();
        assert!(err.is_storage());
        assert!(GatewayError::storage("/tmp/x", "boom").is_storage());
    }

    #[test]
    fn all_errors_have_gg_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(GatewayError::Encoding {
                reason: "NaN".into(),
            }),
            Box::new(GatewayError::Configuration("empty roster".into())),
            Box::new(GatewayError::Internal("test".into())),
            Box::new(GatewayError::storage("/exports/a.json", "denied")),
            Box::new(GatewayError::MalformedDigest {
                field: "signature",
                reason: "odd length".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("GG_ERR_"),
                "Error missing GG_ERR_ prefix: {msg}"
            );
        }
    }
}
