//! # govgate-integrity
//!
//! **Pure deterministic layer for GovGate.**
//!
//! Everything here is a synchronous, CPU-bound transformation with no shared
//! mutable state, safe to call concurrently for different orders:
//!
//! - **Canonical encoding**: same keys and values -> same bytes
//! - **Integrity signing**: SHA-256 content hash + HMAC-SHA256 signature
//! - **Profile selection**: order id -> roster entry, stable across processes
//! - **Sealing / verification** of compliance packets

pub mod canonical;
pub mod sealing;
pub mod selector;
pub mod signer;

pub use canonical::CanonicalEncoder;
pub use sealing::{seal_packet, verify_document, verify_packet};
pub use selector::ProfileSelector;
pub use signer::{IntegritySigner, Seal};
