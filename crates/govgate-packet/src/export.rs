//! Export artifacts: rendering, atomic publishing, and reading back.
//!
//! Both artifacts are rendered from the same in-memory [`CompliancePacket`]:
//! - structured: pretty JSON, body fields in declaration order followed by
//!   `packet_hash` and `signature`
//! - tabular: CSV rows of `(Section, Field, Value)` in a fixed order
//!
//! Publishing stages every artifact in a temp file inside the export
//! directory and only renames them into place once all of them were written
//! and synced. A failure before the renames leaves no artifact behind.
//!
//! The checks and the `APPROVED` decision inside every artifact are
//! simulated: no KYC, AML, ownership or governance review was performed
//! (see [`constants::SIMULATION_NOTICE`]). The notice is not a field of
//! either artifact, so downstream readers of the files must be told out of
//! band.

use std::io::Write;
use std::path::{Path, PathBuf};

use govgate_integrity::{IntegritySigner, verify_document};
use govgate_types::{CompliancePacket, GatewayError, OrderId, Result, constants};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

// ---------------------------------------------------------------------------
// Names and URLs
// ---------------------------------------------------------------------------

/// Stable artifact filenames for one order.
///
/// `OrderId` only admits `[A-Za-z0-9_-]`, so distinct orders never share a
/// filename and no name escapes the export directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub json_file: String,
    pub csv_file: String,
}

impl ArtifactNames {
    #[must_use]
    pub fn for_order(order_id: &OrderId) -> Self {
        let stem = format!("{}{order_id}", constants::EXPORT_FILE_PREFIX);
        Self {
            json_file: format!("{stem}.{}", constants::STRUCTURED_EXPORT_EXT),
            csv_file: format!("{stem}.{}", constants::TABULAR_EXPORT_EXT),
        }
    }

    #[must_use]
    pub fn json_url(&self) -> String {
        format!("{}{}", constants::EXPORT_URL_PREFIX, self.json_file)
    }

    #[must_use]
    pub fn csv_url(&self) -> String {
        format!("{}{}", constants::EXPORT_URL_PREFIX, self.csv_file)
    }
}

/// Map an export URL back to the artifact path under `export_dir`.
///
/// Only bare `packet_<order_id>.json|csv` names under the export prefix are
/// accepted.
pub fn resolve_artifact_url(export_dir: &Path, url: &str) -> Result<PathBuf> {
    let invalid = || GatewayError::InvalidOrderId {
        reason: format!("not an export artifact url: {url}"),
    };
    let name = url
        .strip_prefix(constants::EXPORT_URL_PREFIX)
        .ok_or_else(invalid)?;
    let stem = name
        .strip_suffix(&format!(".{}", constants::STRUCTURED_EXPORT_EXT))
        .or_else(|| name.strip_suffix(&format!(".{}", constants::TABULAR_EXPORT_EXT)))
        .ok_or_else(invalid)?;
    let order = stem
        .strip_prefix(constants::EXPORT_FILE_PREFIX)
        .ok_or_else(invalid)?;
    OrderId::parse(order)?;
    Ok(export_dir.join(name))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// One line of the tabular export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TabularRow {
    pub section: String,
    pub field: String,
    pub value: String,
}

impl TabularRow {
    fn new(section: &str, field: &str, value: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// The fixed row set of the tabular export, in export order.
#[must_use]
pub fn tabular_rows(packet: &CompliancePacket) -> Vec<TabularRow> {
    let order = &packet.body.order;
    let investor = &packet.body.investor;
    vec![
        TabularRow::new("Order", "Order ID", order.id.as_str()),
        TabularRow::new("Order", "Filename", order.uploaded_filename.as_str()),
        TabularRow::new("Order", "Size (bytes)", order.size_bytes.to_string()),
        TabularRow::new("Investor", "Name", investor.name.as_str()),
        TabularRow::new("Investor", "Type", investor.category.as_str()),
        TabularRow::new("Investor", "Domicile", investor.domicile.as_str()),
        TabularRow::new("Investor", "Wallet", investor.wallet_address.as_str()),
        TabularRow::new("Decision", "Status", packet.body.decision.to_string()),
        TabularRow::new("Integrity", "Packet Hash", packet.packet_hash.as_str()),
        TabularRow::new("Integrity", "Signature", packet.signature.as_str()),
    ]
}

/// Pretty JSON of the full packet.
pub fn render_structured(packet: &CompliancePacket) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(packet)?)
}

/// CSV with a `Section,Field,Value` header.
pub fn render_tabular(packet: &CompliancePacket) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in tabular_rows(packet) {
        writer
            .serialize(&row)
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| GatewayError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Stage `contents` next to its destination, synced to disk but not yet visible.
fn stage(dir: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| GatewayError::storage(dir, e))?;
    temp.write_all(contents)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| GatewayError::storage(temp.path(), e))?;
    Ok(temp)
}

/// Write `contents` to `path` via temp file + rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = stage(dir, contents)?;
    temp.persist(path)
        .map_err(|e| GatewayError::storage(path, e.error))?;
    Ok(())
}

/// Publish several files into `dir`: all are staged before any is renamed.
///
/// Returns the final paths in input order. If a rename fails after earlier
/// ones succeeded, the files already renamed are removed again, so the set
/// is never left half-replaced. A previous version of a removed file is not
/// restored.
pub fn publish_all(dir: &Path, files: &[(&str, &[u8])]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| GatewayError::storage(dir, e))?;

    let mut staged = Vec::with_capacity(files.len());
    for (name, contents) in files {
        staged.push((dir.join(name), stage(dir, contents)?));
    }

    let mut published: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (path, temp) in staged {
        if let Err(e) = temp.persist(&path) {
            for done in &published {
                if let Err(cleanup) = std::fs::remove_file(done) {
                    warn!(path = %done.display(), error = %cleanup, "failed to roll back artifact");
                }
            }
            return Err(GatewayError::storage(&path, e.error));
        }
        published.push(path);
    }
    Ok(published)
}

// ---------------------------------------------------------------------------
// Reading back
// ---------------------------------------------------------------------------

/// Parse a structured export.
pub fn read_structured(path: &Path) -> Result<CompliancePacket> {
    let bytes = std::fs::read(path).map_err(|e| GatewayError::storage(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a structured export and check it as published.
///
/// The raw document must verify under `signer`, and it must be exactly the
/// bytes [`render_structured`] produces for the packet it parses to.
///
/// # Errors
/// - [`GatewayError::Storage`] if the file cannot be read
/// - [`GatewayError::IntegrityMismatch`] if the file was altered in any way
pub fn read_verified(path: &Path, signer: &IntegritySigner) -> Result<CompliancePacket> {
    let bytes = std::fs::read(path).map_err(|e| GatewayError::storage(path, e))?;
    verify_document(&bytes, signer)?;
    let packet: CompliancePacket = serde_json::from_slice(&bytes)?;
    if render_structured(&packet)? != bytes {
        return Err(GatewayError::IntegrityMismatch {
            field: "export",
            stored: packet.packet_hash,
        });
    }
    Ok(packet)
}

/// Parse a tabular export.
pub fn read_tabular(path: &Path) -> Result<Vec<TabularRow>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| GatewayError::storage(path, e))?;
    reader
        .deserialize::<TabularRow>()
        .map(|row| row.map_err(|e| GatewayError::Serialization(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use govgate_integrity::seal_packet;
    use govgate_types::{OrderRecord, PacketBody, Roster, SecretKey};

    use super::*;

    fn packet() -> CompliancePacket {
        let record = OrderRecord::sample("ORD-ABCDEF01", "contract, final.pdf", 2048);
        let now = DateTime::parse_from_rfc3339("2026-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let body = PacketBody::assemble(&record, Roster::builtin().get(3).unwrap().clone(), now);
        let signer = IntegritySigner::new(SecretKey::new(b"demo-secret".to_vec()).unwrap());
        seal_packet(body, &signer).unwrap()
    }

    #[test]
    fn names_and_urls() {
        let names = ArtifactNames::for_order(&OrderId::parse("ORD-ABCDEF01").unwrap());
        assert_eq!(names.json_file, "packet_ORD-ABCDEF01.json");
        assert_eq!(names.csv_file, "packet_ORD-ABCDEF01.csv");
        assert_eq!(names.json_url(), "/exports/packet_ORD-ABCDEF01.json");
        assert_eq!(names.csv_url(), "/exports/packet_ORD-ABCDEF01.csv");
    }

    #[test]
    fn resolve_accepts_only_artifact_names() {
        let dir = Path::new("/srv/exports");
        assert_eq!(
            resolve_artifact_url(dir, "/exports/packet_ORD-ABCDEF01.csv").unwrap(),
            dir.join("packet_ORD-ABCDEF01.csv")
        );
        assert!(resolve_artifact_url(dir, "/exports/../secret.json").is_err());
        assert!(resolve_artifact_url(dir, "/exports/packet_a/b.json").is_err());
        assert!(resolve_artifact_url(dir, "/exports/other.json").is_err());
        assert!(resolve_artifact_url(dir, "/uploads/packet_ORD-1.json").is_err());
        assert!(resolve_artifact_url(dir, "/exports/packet_ORD-1.txt").is_err());
    }

    #[test]
    fn tabular_rows_fixed_order() {
        let p = packet();
        let rows = tabular_rows(&p);
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.section.as_str(), r.field.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Order", "Order ID"),
                ("Order", "Filename"),
                ("Order", "Size (bytes)"),
                ("Investor", "Name"),
                ("Investor", "Type"),
                ("Investor", "Domicile"),
                ("Investor", "Wallet"),
                ("Decision", "Status"),
                ("Integrity", "Packet Hash"),
                ("Integrity", "Signature"),
            ]
        );
        assert_eq!(rows[2].value, "2048");
        assert_eq!(rows[7].value, "APPROVED");
        assert_eq!(rows[9].value, p.signature);
    }

    #[test]
    fn tabular_render_has_header_and_quotes_commas() {
        let csv = String::from_utf8(render_tabular(&packet()).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Section,Field,Value"));
        assert_eq!(lines.next(), Some("Order,Order ID,ORD-ABCDEF01"));
        assert_eq!(lines.next(), Some("Order,Filename,\"contract, final.pdf\""));
        assert_eq!(csv.lines().count(), 11);
    }

    #[test]
    fn structured_render_reads_back_equal() {
        let p = packet();
        let bytes = render_structured(&p).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with("{\n  \"packet_version\": \"1.0\""));
        let back: CompliancePacket = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn publish_all_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = publish_all(
            dir.path(),
            &[("a.json", b"{}".as_slice()), ("a.csv", b"x\n".as_slice())],
        )
        .unwrap();
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"{}");
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"x\n");
        // Nothing but the two artifacts is left in the directory.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn failed_rename_rolls_back_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the second name cannot be renamed over.
        let blocked = dir.path().join("a.csv");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), b"").unwrap();

        let err = publish_all(
            dir.path(),
            &[("a.json", b"{}".as_slice()), ("a.csv", b"x\n".as_slice())],
        )
        .unwrap_err();
        assert!(err.is_storage(), "Got: {err:?}");
        assert!(!dir.path().join("a.json").exists());
        // Only the blocker is left: no artifact, no temp file.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn read_verified_accepts_only_published_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packet_ORD-ABCDEF01.json");
        let signer = IntegritySigner::new(SecretKey::new(b"demo-secret".to_vec()).unwrap());
        let p = packet();
        write_atomic(&path, &render_structured(&p).unwrap()).unwrap();
        assert_eq!(read_verified(&path, &signer).unwrap(), p);

        // Same content, different layout: the signature still holds but the
        // file is not what was published.
        let compact = serde_json::to_vec(&p).unwrap();
        write_atomic(&path, &compact).unwrap();
        assert!(matches!(
            read_verified(&path, &signer),
            Err(GatewayError::IntegrityMismatch { field: "export", .. })
        ));
    }

    #[test]
    fn publish_into_unusable_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let err = publish_all(&blocker, &[("a.json", b"{}".as_slice())]).unwrap_err();
        assert!(err.is_storage(), "Got: {err:?}");
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }
}
