//! Sealing a packet body and verifying a sealed packet.
//!
//! The hash and signature cover the canonical encoding of the
//! [`PacketBody`] only. A consumer holding the secret verifies a packet by
//! re-encoding the body it received and recomputing both values.
//!
//! [`verify_document`] checks a packet as received on the wire: every key
//! in the document except the two integrity fields is covered, including
//! keys the typed model does not know, and values are hashed in the exact
//! form they were sent.

use govgate_types::{CompliancePacket, GatewayError, PacketBody, Result};
use serde_json::{Map, Value};

use crate::{CanonicalEncoder, IntegritySigner};

/// Encode, hash and sign `body`, producing the immutable packet.
pub fn seal_packet(body: PacketBody, signer: &IntegritySigner) -> Result<CompliancePacket> {
    let canonical = CanonicalEncoder::encode(&body)?;
    let seal = signer.seal(&canonical)?;
    Ok(CompliancePacket {
        body,
        packet_hash: seal.packet_hash,
        signature: seal.signature,
    })
}

/// Recompute and check `packet_hash` and `signature` for `packet`.
///
/// # Errors
/// [`GatewayError::IntegrityMismatch`] on any difference.
pub fn verify_packet(packet: &CompliancePacket, signer: &IntegritySigner) -> Result<()> {
    let canonical = CanonicalEncoder::encode(&packet.body)?;
    signer.verify(&canonical, &packet.packet_hash, &packet.signature)
}

/// Verify a serialized packet without going through the typed model.
///
/// `packet_hash` and `signature` are removed from the top-level object and
/// everything left is canonically re-encoded as received.
///
/// # Errors
/// - [`GatewayError::Serialization`] if `bytes` is not a JSON object
/// - [`GatewayError::MalformedDigest`] if an integrity field is missing or not a string
/// - [`GatewayError::IntegrityMismatch`] on any difference
pub fn verify_document(bytes: &[u8], signer: &IntegritySigner) -> Result<()> {
    let mut document: Map<String, Value> = serde_json::from_slice(bytes)?;
    let packet_hash = take_digest(&mut document, "packet_hash")?;
    let signature = take_digest(&mut document, "signature")?;
    let canonical = CanonicalEncoder::encode(&document)?;
    signer.verify(&canonical, &packet_hash, &signature)
}

fn take_digest(document: &mut Map<String, Value>, field: &'static str) -> Result<String> {
    match document.remove(field) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(GatewayError::MalformedDigest {
            field,
            reason: "not a string".into(),
        }),
        None => Err(GatewayError::MalformedDigest {
            field,
            reason: "missing".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use govgate_types::{OrderRecord, Roster, SecretKey};

    use super::*;

    fn signer() -> IntegritySigner {
        IntegritySigner::new(SecretKey::new(b"demo-secret".to_vec()).unwrap())
    }

    fn body_at(ts: &str) -> PacketBody {
        let record = OrderRecord::sample("ORD-ABCDEF01", "contract.pdf", 2048);
        let now = DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc);
        PacketBody::assemble(&record, Roster::builtin().get(3).unwrap().clone(), now)
    }

    #[test]
    fn seal_then_verify() {
        let packet = seal_packet(body_at("2026-01-15T10:00:00Z"), &signer()).unwrap();
        assert!(verify_packet(&packet, &signer()).is_ok());
    }

    #[test]
    fn pinned_canonical_form_and_seal() {
        let body = body_at("2026-01-15T10:00:00Z");
        let canonical = CanonicalEncoder::encode_to_string(&body).unwrap();
        assert_eq!(
            canonical,
            concat!(
                r#"{"checks":{"aml_sanctions":{"flags":[],"pass":true},"governance":{"approvals":"#,
                r#"[{"approver":"OpRisk Desk","timestamp":"2026-01-15T10:00:00Z"},"#,
                r#"{"approver":"GS DAP Compliance","timestamp":"2026-01-15T10:00:00Z"}],"pass":true},"#,
                r#""kyc_kyb":{"pass":true,"rationale":"Identity and entity records validated against internal registry."},"#,
                r#""ownership_pep":{"pass":true,"rationale":"No PEP exposure detected across nested ownership layers."}},"#,
                r#""decision":"APPROVED","generated_at":"2026-01-15T10:00:00Z","#,
                r#""investor":{"domicile":"United States","id":"INV-FO-004","name":"North River Family Office","#,
                r#""type":"FamilyOffice","wallet_address":"0xC0ffee2540B1eCafe001234567890abcdef98765"},"#,
                r#""order":{"id":"ORD-ABCDEF01","mime":"application/pdf","size_bytes":2048,"uploaded_filename":"contract.pdf"},"#,
                r#""packet_version":"1.0"}"#,
            )
        );

        let packet = seal_packet(body, &signer()).unwrap();
        assert_eq!(
            packet.packet_hash,
            "844fb3d1a35db5a931eec3b75cf09ffb439e088868406168764bdc722fcd3f82"
        );
        assert_eq!(
            packet.signature,
            "f6e1a8f4eefd52bdbff2ad4bfe4217e38e189e5a7f31b89f377a8073adcb69b4"
        );
    }

    #[test]
    fn same_body_same_seal() {
        let a = seal_packet(body_at("2026-01-15T10:00:00Z"), &signer()).unwrap();
        let b = seal_packet(body_at("2026-01-15T10:00:00Z"), &signer()).unwrap();
        assert_eq!(a.packet_hash, b.packet_hash);
        assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn any_field_change_moves_both_values() {
        let base = seal_packet(body_at("2026-01-15T10:00:00Z"), &signer()).unwrap();

        let mut variants = Vec::new();
        let mut b = body_at("2026-01-15T10:00:00Z");
        b.order.size_bytes += 1;
        variants.push(b);
        let mut b = body_at("2026-01-15T10:00:00Z");
        b.order.uploaded_filename = "contract2.pdf".into();
        variants.push(b);
        let mut b = body_at("2026-01-15T10:00:00Z");
        b.investor = Roster::builtin().get(0).unwrap().clone();
        variants.push(b);
        let mut b = body_at("2026-01-15T10:00:00Z");
        b.checks.aml_sanctions.flags.push("watchlist".into());
        variants.push(b);
        variants.push(body_at("2026-01-15T10:00:01Z"));

        for body in variants {
            let sealed = seal_packet(body, &signer()).unwrap();
            assert_ne!(sealed.packet_hash, base.packet_hash);
            assert_ne!(sealed.signature, base.signature);
        }
    }

    #[test]
    fn tampered_packet_fails_verification() {
        let mut packet = seal_packet(body_at("2026-01-15T10:00:00Z"), &signer()).unwrap();
        packet.body.order.size_bytes = 1;
        let err = verify_packet(&packet, &signer()).unwrap_err();
        assert!(err.is_integrity(), "Got: {err:?}");
    }

    #[test]
    fn wrong_key_fails_verification() {
        let packet = seal_packet(body_at("2026-01-15T10:00:00Z"), &signer()).unwrap();
        let other = IntegritySigner::new(SecretKey::new(b"other".to_vec()).unwrap());
        assert!(matches!(
            verify_packet(&packet, &other),
            Err(GatewayError::IntegrityMismatch { field: "signature", .. })
        ));
    }

    fn pretty_document() -> String {
        let packet = seal_packet(body_at("2026-01-15T10:00:00Z"), &signer()).unwrap();
        serde_json::to_string_pretty(&packet).unwrap()
    }

    #[test]
    fn document_verifies_in_any_layout() {
        let pretty = pretty_document();
        assert!(verify_document(pretty.as_bytes(), &signer()).is_ok());

        let value: Value = serde_json::from_str(&pretty).unwrap();
        let compact = serde_json::to_vec(&value).unwrap();
        assert!(verify_document(&compact, &signer()).is_ok());
    }

    #[test]
    fn document_with_extra_key_fails() {
        let pretty = pretty_document();
        let injected = pretty.replacen('{', "{\n  \"override\": \"REJECTED\",", 1);
        assert!(serde_json::from_str::<Value>(&injected).is_ok());

        let err = verify_document(injected.as_bytes(), &signer()).unwrap_err();
        assert!(
            matches!(err, GatewayError::IntegrityMismatch { field: "packet_hash", .. }),
            "Got: {err:?}"
        );
    }

    #[test]
    fn document_with_rewritten_timestamp_fails() {
        // Same instant, different spelling.
        let pretty = pretty_document();
        let rewritten = pretty.replace(
            "\"generated_at\": \"2026-01-15T10:00:00Z\"",
            "\"generated_at\": \"2026-01-15T10:00:00+00:00\"",
        );
        assert_ne!(pretty, rewritten);

        let err = verify_document(rewritten.as_bytes(), &signer()).unwrap_err();
        assert!(err.is_integrity(), "Got: {err:?}");
    }

    #[test]
    fn document_without_integrity_fields_is_malformed() {
        let mut value: Value = serde_json::from_str(&pretty_document()).unwrap();
        value.as_object_mut().unwrap().remove("signature");
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            verify_document(&bytes, &signer()),
            Err(GatewayError::MalformedDigest { field: "signature", .. })
        ));

        let mut value: Value = serde_json::from_str(&pretty_document()).unwrap();
        value["packet_hash"] = Value::from(42);
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            verify_document(&bytes, &signer()),
            Err(GatewayError::MalformedDigest { field: "packet_hash", .. })
        ));
    }

    #[test]
    fn document_that_is_not_an_object_is_rejected() {
        let err = verify_document(b"[1,2,3]", &signer()).unwrap_err();
        assert!(matches!(err, GatewayError::Serialization(_)), "Got: {err:?}");
    }
}
