//! The order record lifecycle.
//!
//! ```text
//!   upload                     finalize (exactly once)
//!   ──────▶ { finalized: false,  ─────────────────────▶ { finalized: true,
//!             packet: None }                              packet: Some(ref) }
//! ```
//!
//! `finalized == true` iff `packet` is present. The order store is the only
//! owner of a record; everything else works on copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GatewayError, OrderId, Result};

/// Externally visible handle to a finalized compliance packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketReference {
    /// URL of the structured (JSON) export.
    pub json_url: String,
    /// URL of the tabular (CSV) export.
    pub csv_url: String,
    /// Hex SHA-256 of the canonical packet body.
    pub packet_hash: String,
    /// Hex HMAC-SHA256 of the canonical packet body.
    pub signature: String,
}

/// One uploaded document submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    /// Sanitized client filename.
    pub uploaded_filename: String,
    /// Name of the stored upload (`<order_id>_<uploaded_filename>`).
    pub stored_filename: String,
    pub mime: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub finalized: bool,
    pub packet: Option<PacketReference>,
}

impl OrderRecord {
    /// A freshly uploaded, not yet finalized record.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        uploaded_filename: impl Into<String>,
        stored_filename: impl Into<String>,
        mime: impl Into<String>,
        size_bytes: u64,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            uploaded_filename: uploaded_filename.into(),
            stored_filename: stored_filename.into(),
            mime: mime.into(),
            size_bytes,
            uploaded_at,
            finalized: false,
            packet: None,
        }
    }

    /// The packet reference, if this order has been finalized.
    #[must_use]
    pub fn finalized_packet(&self) -> Option<&PacketReference> {
        if self.finalized {
            self.packet.as_ref()
        } else {
            None
        }
    }

    /// Check the `finalized <=> packet` invariant.
    pub fn validate(&self) -> Result<()> {
        match (self.finalized, self.packet.is_some()) {
            (true, false) => Err(self.inconsistent("finalized without a packet reference")),
            (false, true) => Err(self.inconsistent("packet reference on an unfinalized order")),
            _ => Ok(()),
        }
    }

    /// Attach the packet reference. Allowed exactly once.
    ///
    /// # Errors
    /// Returns [`GatewayError::InconsistentRecord`] if already finalized.
    pub fn mark_finalized(&mut self, reference: PacketReference) -> Result<()> {
        if self.finalized || self.packet.is_some() {
            return Err(self.inconsistent("order already finalized"));
        }
        self.finalized = true;
        self.packet = Some(reference);
        Ok(())
    }

    /// Merge a partial update into this record, then re-check the invariant.
    ///
    /// On error the record is left unchanged.
    pub fn apply(&mut self, patch: OrderPatch) -> Result<()> {
        let mut next = self.clone();
        if let Some(v) = patch.uploaded_filename {
            next.uploaded_filename = v;
        }
        if let Some(v) = patch.stored_filename {
            next.stored_filename = v;
        }
        if let Some(v) = patch.mime {
            next.mime = v;
        }
        if let Some(v) = patch.size_bytes {
            next.size_bytes = v;
        }
        if let Some(v) = patch.finalized {
            next.finalized = v;
        }
        if let Some(v) = patch.packet {
            next.packet = v;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn inconsistent(&self, reason: &str) -> GatewayError {
        GatewayError::InconsistentRecord {
            order_id: self.order_id.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Typed partial update for [`OrderRecord`]. `None` leaves a field untouched.
///
/// `order_id` and `uploaded_at` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub uploaded_filename: Option<String>,
    pub stored_filename: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<u64>,
    pub finalized: Option<bool>,
    pub packet: Option<Option<PacketReference>>,
}

impl OrderPatch {
    /// Patch that finalizes an order with the given reference.
    #[must_use]
    pub fn finalize(reference: PacketReference) -> Self {
        Self {
            finalized: Some(true),
            packet: Some(Some(reference)),
            ..Self::default()
        }
    }
}

/// Sample records for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl OrderRecord {
    /// Unfinalized record for `order_id` with a fixed upload timestamp.
    pub fn sample(order_id: &str, filename: &str, size_bytes: u64) -> Self {
        let order_id = OrderId::parse(order_id).expect("sample order id must be valid");
        let stored = format!("{order_id}_{filename}");
        Self::new(
            order_id,
            filename,
            stored,
            crate::constants::DEFAULT_UPLOAD_MIME,
            size_bytes,
            DateTime::parse_from_rfc3339("2026-01-15T09:30:00Z")
                .expect("fixed timestamp parses")
                .with_timezone(&Utc),
        )
    }
}
