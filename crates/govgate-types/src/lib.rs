//! # govgate-types
//!
//! Shared types, errors, and configuration for the **GovGate** compliance
//! gateway.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`OrderId`]
//! - **Order lifecycle**: [`OrderRecord`], [`OrderPatch`], [`PacketReference`]
//! - **Profiles**: [`ReviewerProfile`], [`Roster`]
//! - **Packet model**: [`PacketBody`], [`CompliancePacket`], [`Checks`], [`Decision`]
//! - **Configuration**: [`GatewayConfig`], [`SecretKey`]
//! - **Errors**: [`GatewayError`] with `GG_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod order;
pub mod packet;
pub mod profile;

pub use config::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use packet::*;
pub use profile::*;

// Constants are accessed via `govgate_types::constants::FOO`
// (not re-exported to avoid name collisions).
