//! The order lifecycle: upload → finalize (once) → verify / send.
//!
//! `Gateway` owns the store, so every mutating operation takes `&mut self`
//! and at most one finalize per process is in flight. Several processes
//! sharing a data directory must serialize finalize per order themselves.

use chrono::{DateTime, Utc};
use govgate_packet::PacketBuilder;
use govgate_packet::export::{read_verified, resolve_artifact_url};
use govgate_types::{
    CompliancePacket, GatewayConfig, GatewayError, OrderId, OrderRecord, PacketReference, Result,
};
use tracing::{info, warn};

use crate::intake::UploadIntake;
use crate::rail::{RailEntry, RailLog};
use crate::store::{JsonFileOrderStore, OrderStore};

/// Upload, finalize, verify and send orders against one data directory.
#[derive(Debug)]
pub struct Gateway<S> {
    config: GatewayConfig,
    store: S,
    intake: UploadIntake,
    builder: PacketBuilder,
    rail: RailLog,
}

impl Gateway<JsonFileOrderStore> {
    /// Gateway over the JSON store at `config.store_path`.
    pub fn open(config: GatewayConfig) -> Result<Self> {
        let store = JsonFileOrderStore::open(&config.store_path)?;
        Self::new(config, store)
    }
}

impl<S: OrderStore> Gateway<S> {
    /// Wire a gateway over `store`.
    ///
    /// # Errors
    /// - [`GatewayError::Configuration`] if no secret is configured
    /// - [`GatewayError::Storage`] if a data directory cannot be created
    pub fn new(config: GatewayConfig, store: S) -> Result<Self> {
        let builder = PacketBuilder::from_config(&config)?;
        config.ensure_dirs()?;
        Ok(Self {
            intake: UploadIntake::from_config(&config),
            rail: RailLog::in_dir(&config.log_dir),
            config,
            store,
            builder,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn rail_log(&self) -> &RailLog {
        &self.rail
    }

    /// The stored record for `order_id`.
    ///
    /// # Errors
    /// [`GatewayError::OrderNotFound`] if there is none.
    pub fn get(&self, order_id: &OrderId) -> Result<OrderRecord> {
        self.store
            .get(order_id)?
            .ok_or_else(|| GatewayError::OrderNotFound(order_id.clone()))
    }

    /// Every known order id.
    pub fn order_ids(&self) -> Result<Vec<OrderId>> {
        self.store.order_ids()
    }

    /// Accept an uploaded document and persist its new order record.
    pub fn upload(&mut self, filename: &str, contents: &[u8]) -> Result<OrderRecord> {
        self.upload_at(filename, contents, Utc::now())
    }

    pub fn upload_at(
        &mut self,
        filename: &str,
        contents: &[u8],
        now: DateTime<Utc>,
    ) -> Result<OrderRecord> {
        let record = self.intake.accept(filename, contents, now)?;
        self.store.set(&record.order_id, record.clone())?;
        Ok(record)
    }

    /// Build, sign and publish the packet for `order_id`, exactly once.
    ///
    /// A finalized order returns its stored reference untouched. On any
    /// error the stored record is left as it was (`finalized == false`), so
    /// the call can be retried.
    pub fn finalize(&mut self, order_id: &OrderId) -> Result<PacketReference> {
        self.finalize_at(order_id, Utc::now())
    }

    pub fn finalize_at(
        &mut self,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<PacketReference> {
        let record = self.get(order_id)?;
        record.validate()?;
        if let Some(existing) = record.finalized_packet() {
            info!(order_id = %order_id, "order already finalized");
            return Ok(existing.clone());
        }

        let built = self.builder.build_at(order_id, &record, now)?;

        let mut finalized = record;
        finalized.mark_finalized(built.reference.clone())?;
        self.store.set(order_id, finalized)?;

        info!(
            order_id = %order_id,
            packet_hash = %built.reference.packet_hash,
            "order finalized"
        );
        Ok(built.reference)
    }

    /// Read the published structured export of `order_id` and check it
    /// against the secret and the stored reference.
    ///
    /// The file is checked as raw bytes, so added keys or a re-spelled
    /// value fail even when they parse to the same packet.
    ///
    /// # Errors
    /// - [`GatewayError::OrderNotFound`] if the order is unknown or not finalized
    /// - [`GatewayError::IntegrityMismatch`] if the export was altered
    pub fn verify_export(&self, order_id: &OrderId) -> Result<CompliancePacket> {
        let record = self.get(order_id)?;
        let reference = record
            .finalized_packet()
            .ok_or_else(|| GatewayError::OrderNotFound(order_id.clone()))?;

        let path = resolve_artifact_url(&self.config.export_dir, &reference.json_url)?;
        let packet = match read_verified(&path, self.builder.signer()) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "export failed verification");
                return Err(e);
            }
        };
        if packet.packet_hash != reference.packet_hash {
            warn!(order_id = %order_id, "export does not match the stored reference");
            return Err(GatewayError::IntegrityMismatch {
                field: "packet_hash",
                stored: reference.packet_hash.clone(),
            });
        }
        Ok(packet)
    }

    /// Verify the export and append it to the rail log.
    pub fn send(&mut self, order_id: &OrderId) -> Result<RailEntry> {
        self.send_at(order_id, Utc::now())
    }

    pub fn send_at(&mut self, order_id: &OrderId, now: DateTime<Utc>) -> Result<RailEntry> {
        let packet = self.verify_export(order_id)?;
        let entry = RailEntry {
            sent_at: now,
            order_id: order_id.clone(),
            packet_hash: packet.packet_hash,
        };
        self.rail.append(&entry)?;
        info!(order_id = %order_id, packet_hash = %entry.packet_hash, "packet sent to rail");
        Ok(entry)
    }
}
