//! Content hashing and keyed signing over canonical bytes.
//!
//! Two independent derivations over the same input:
//! - `packet_hash` = SHA-256(bytes), key-free, usable for content addressing
//! - `signature`   = HMAC-SHA256(secret, bytes), proves the gateway produced it
//!
//! Both are lowercase hex, 64 characters.

use govgate_types::{GatewayError, Result, SecretKey};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Digest length in bytes for both the hash and the MAC.
pub const DIGEST_LEN: usize = 32;

/// The integrity pair attached to a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seal {
    pub packet_hash: String,
    pub signature: String,
}

/// Holds the server secret and produces / checks [`Seal`]s.
#[derive(Debug, Clone)]
pub struct IntegritySigner {
    key: SecretKey,
}

impl IntegritySigner {
    #[must_use]
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Hex SHA-256 of `bytes`. Independent of any key.
    #[must_use]
    pub fn content_hash(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| GatewayError::Configuration(format!("invalid signing secret: {e}")))
    }

    /// Hex HMAC-SHA256 of `bytes` under the server secret.
    pub fn sign(&self, bytes: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(bytes);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Hash and sign `bytes`.
    pub fn seal(&self, bytes: &[u8]) -> Result<Seal> {
        Ok(Seal {
            packet_hash: Self::content_hash(bytes),
            signature: self.sign(bytes)?,
        })
    }

    /// Check a stored hash and signature against `bytes`.
    ///
    /// The MAC comparison is constant-time.
    ///
    /// # Errors
    /// - [`GatewayError::MalformedDigest`] if either value is not 32 bytes of hex
    /// - [`GatewayError::IntegrityMismatch`] if either value does not match
    pub fn verify(&self, bytes: &[u8], packet_hash: &str, signature: &str) -> Result<()> {
        let stored_hash = decode_digest("packet_hash", packet_hash)?;
        let stored_sig = decode_digest("signature", signature)?;

        if Sha256::digest(bytes).as_slice() != stored_hash.as_slice() {
            return Err(GatewayError::IntegrityMismatch {
                field: "packet_hash",
                stored: packet_hash.to_string(),
            });
        }

        let mut mac = self.mac()?;
        mac.update(bytes);
        mac.verify_slice(&stored_sig)
            .map_err(|_| GatewayError::IntegrityMismatch {
                field: "signature",
                stored: signature.to_string(),
            })
    }
}

fn decode_digest(field: &'static str, value: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(value).map_err(|e| GatewayError::MalformedDigest {
        field,
        reason: e.to_string(),
    })?;
    if bytes.len() != DIGEST_LEN {
        return Err(GatewayError::MalformedDigest {
            field,
            reason: format!("expected {DIGEST_LEN} bytes, got {}", bytes.len()),
        });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &[u8]) -> IntegritySigner {
        IntegritySigner::new(SecretKey::new(secret.to_vec()).unwrap())
    }

    #[test]
    fn known_vectors() {
        // SHA-256("abc") and RFC 4231 test case 2.
        assert_eq!(
            IntegritySigner::content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            signer(b"Jefe").sign(b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn seal_is_64_hex_each() {
        let seal = signer(b"demo-secret").seal(b"{}").unwrap();
        assert_eq!(seal.packet_hash.len(), 64);
        assert_eq!(seal.signature.len(), 64);
        assert!(seal.packet_hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(seal.packet_hash, seal.signature);
    }

    #[test]
    fn hash_is_key_independent_signature_is_not() {
        let a = signer(b"key-a").seal(b"payload").unwrap();
        let b = signer(b"key-b").seal(b"payload").unwrap();
        assert_eq!(a.packet_hash, b.packet_hash);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn verify_accepts_own_seal() {
        let s = signer(b"demo-secret");
        let seal = s.seal(b"payload").unwrap();
        assert!(s.verify(b"payload", &seal.packet_hash, &seal.signature).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_bytes() {
        let s = signer(b"demo-secret");
        let seal = s.seal(b"payload").unwrap();
        let err = s
            .verify(b"payload!", &seal.packet_hash, &seal.signature)
            .unwrap_err();
        assert!(
            matches!(err, GatewayError::IntegrityMismatch { field: "packet_hash", .. }),
            "Got: {err:?}"
        );
    }

    #[test]
    fn recomputed_hash_without_key_does_not_forge() {
        let s = signer(b"demo-secret");
        let forged_bytes = b"forged";
        let forged_hash = IntegritySigner::content_hash(forged_bytes);
        let attacker_sig = signer(b"guess").sign(forged_bytes).unwrap();
        let err = s.verify(forged_bytes, &forged_hash, &attacker_sig).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::IntegrityMismatch { field: "signature", .. }
        ));
    }

    #[test]
    fn malformed_digests_rejected() {
        let s = signer(b"demo-secret");
        let seal = s.seal(b"payload").unwrap();
        assert!(matches!(
            s.verify(b"payload", "zz", &seal.signature),
            Err(GatewayError::MalformedDigest { field: "packet_hash", .. })
        ));
        assert!(matches!(
            s.verify(b"payload", &seal.packet_hash, "abcd"),
            Err(GatewayError::MalformedDigest { field: "signature", .. })
        ));
    }
}
