//! # govgate-packet
//!
//! **Packet plane**: turns an uploaded order into a signed compliance packet
//! and publishes its two exports.
//!
//! ## Flow
//!
//! ```text
//! OrderRecord → ProfileSelector → PacketBody → CanonicalEncoder → IntegritySigner
//!     → CompliancePacket → { packet_<id>.json, packet_<id>.csv } → PacketReference
//! ```
//!
//! The check block is a simulation (always APPROVED); downstream consumers
//! must not read it as a real compliance outcome.

pub mod builder;
pub mod export;

pub use builder::{BuiltPacket, PacketBuilder};
pub use export::{ArtifactNames, TabularRow, resolve_artifact_url};
