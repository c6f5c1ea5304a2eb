//! # govgate-gateway
//!
//! **Lifecycle plane**: owns order records and drives them from upload to a
//! finalized, verifiable compliance packet.
//!
//! ## Operations
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `upload` | store the PDF, persist an unfinalized [`OrderRecord`](govgate_types::OrderRecord) |
//! | `finalize` | build + publish the packet once, attach its reference |
//! | `verify_export` | re-check the published JSON against hash and MAC |
//! | `send` | verify, then append an audit line to `rail_stub.log` |
//!
//! ## Single writer
//!
//! Nothing here locks. [`Gateway`] takes `&mut self` for mutations, which
//! serializes them inside one process only.

pub mod gateway;
pub mod intake;
pub mod rail;
pub mod store;

pub use gateway::Gateway;
pub use intake::{UploadIntake, sanitize_filename};
pub use rail::{RailEntry, RailLog};
pub use store::{JsonFileOrderStore, MemoryOrderStore, OrderStore};
