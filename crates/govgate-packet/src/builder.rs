//! Compliance packet construction.
//!
//! For one order:
//! 1. Select the reviewer profile from the order id
//! 2. Assemble the unsigned body (order subset, profile, stub checks, decision)
//! 3. Canonicalize and seal the body (hash + HMAC)
//! 4. Render both exports from the sealed packet
//! 5. Publish both artifacts atomically
//! 6. Return the [`PacketReference`]
//!
//! The builder never looks at `finalized` and never touches the order store:
//! idempotence belongs to the caller, which must invoke it at most once per
//! order and must not run two builds for the same order concurrently.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use govgate_integrity::{IntegritySigner, ProfileSelector, seal_packet};
use govgate_types::{
    CompliancePacket, GatewayConfig, GatewayError, OrderId, OrderRecord, PacketBody,
    PacketReference, Result,
};
use tracing::{debug, info};

use crate::export::{self, ArtifactNames};

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuiltPacket {
    pub packet: CompliancePacket,
    pub reference: PacketReference,
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Builds, seals and publishes compliance packets.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    selector: ProfileSelector,
    signer: IntegritySigner,
    export_dir: PathBuf,
}

impl PacketBuilder {
    #[must_use]
    pub fn new(
        selector: ProfileSelector,
        signer: IntegritySigner,
        export_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            selector,
            signer,
            export_dir: export_dir.as_ref().to_path_buf(),
        }
    }

    /// Builder over the built-in roster using the configured secret.
    ///
    /// # Errors
    /// [`GatewayError::Configuration`] if no secret is configured.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let signer = IntegritySigner::new(config.require_secret()?.clone());
        Ok(Self::new(ProfileSelector::builtin(), signer, &config.export_dir))
    }

    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    #[must_use]
    pub fn signer(&self) -> &IntegritySigner {
        &self.signer
    }

    /// Build and publish the packet for `order_id` now.
    pub fn build(&self, order_id: &OrderId, record: &OrderRecord) -> Result<BuiltPacket> {
        self.build_at(order_id, record, Utc::now())
    }

    /// Build and publish the packet with `now` as the generation time.
    ///
    /// # Errors
    /// - [`GatewayError::InconsistentRecord`] if `record` belongs to another order
    /// - [`GatewayError::Encoding`] if the body cannot be canonicalized (nothing is written)
    /// - [`GatewayError::Storage`] if an artifact cannot be published
    pub fn build_at(
        &self,
        order_id: &OrderId,
        record: &OrderRecord,
        now: DateTime<Utc>,
    ) -> Result<BuiltPacket> {
        let packet = self.seal_at(order_id, record, now)?;

        let json = export::render_structured(&packet)?;
        let csv = export::render_tabular(&packet)?;
        let names = ArtifactNames::for_order(order_id);

        let paths = export::publish_all(
            &self.export_dir,
            &[(names.json_file.as_str(), &json[..]), (names.csv_file.as_str(), &csv[..])],
        )?;
        let [json_path, csv_path]: [PathBuf; 2] = paths
            .try_into()
            .map_err(|_| GatewayError::Internal("expected two published artifacts".to_string()))?;

        info!(
            order_id = %order_id,
            packet_hash = %packet.packet_hash,
            json = %json_path.display(),
            csv = %csv_path.display(),
            "compliance packet published"
        );

        let reference = PacketReference {
            json_url: names.json_url(),
            csv_url: names.csv_url(),
            packet_hash: packet.packet_hash.clone(),
            signature: packet.signature.clone(),
        };
        Ok(BuiltPacket {
            packet,
            reference,
            json_path,
            csv_path,
        })
    }

    /// Assemble and seal the packet without writing anything.
    pub fn seal_at(
        &self,
        order_id: &OrderId,
        record: &OrderRecord,
        now: DateTime<Utc>,
    ) -> Result<CompliancePacket> {
        if &record.order_id != order_id {
            return Err(GatewayError::InconsistentRecord {
                order_id: order_id.clone(),
                reason: format!("record belongs to {}", record.order_id),
            });
        }

        let investor = self.selector.select(order_id).clone();
        debug!(
            order_id = %order_id,
            investor = %investor.id,
            roster_version = self.selector.roster().version(),
            "reviewer profile selected"
        );

        let body = PacketBody::assemble(record, investor, now);
        seal_packet(body, &self.signer)
    }
}
