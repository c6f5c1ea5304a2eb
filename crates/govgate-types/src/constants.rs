//! System-wide constants for the GovGate compliance gateway.

/// Version stamped into every compliance packet.
pub const PACKET_VERSION: &str = "1.0";

/// Prefix for every generated order identifier.
pub const ORDER_ID_PREFIX: &str = "ORD-";

/// Number of hex characters following [`ORDER_ID_PREFIX`] in generated ids.
pub const ORDER_ID_HEX_LEN: usize = 8;

/// Upper bound on accepted order identifier length (generated or parsed).
pub const MAX_ORDER_ID_LEN: usize = 64;

/// URL prefix under which export artifacts are published.
pub const EXPORT_URL_PREFIX: &str = "/exports/";

/// Filename prefix for both export artifacts.
pub const EXPORT_FILE_PREFIX: &str = "packet_";

/// Extension of the structured (JSON) export.
pub const STRUCTURED_EXPORT_EXT: &str = "json";

/// Extension of the tabular (CSV) export.
pub const TABULAR_EXPORT_EXT: &str = "csv";

/// The only accepted upload extension (compared case-insensitively).
pub const ACCEPTED_UPLOAD_EXT: &str = ".pdf";

/// Mime type recorded when none can be derived from the filename.
pub const DEFAULT_UPLOAD_MIME: &str = "application/pdf";

/// Default upload size bound (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Audit log file receiving one line per "send to rail".
pub const RAIL_LOG_FILE: &str = "rail_stub.log";

/// Order store file, relative to the data directory.
pub const STORE_FILE: &str = "tmp/session_store.json";

/// Environment variable holding the signing secret.
pub const ENV_SECRET: &str = "GOVGATE_SECRET";

/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "GOVGATE_DATA_DIR";

/// Data directory used when [`ENV_DATA_DIR`] is unset.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Disclosure for every packet: the check block is a fixed stub. Not part
/// of the signed body; shown to operators when a packet is finalized.
pub const SIMULATION_NOTICE: &str =
    "Simulated review: all checks are fixed stubs and the decision is always APPROVED. \
     This packet is not the output of any real KYC/AML evaluation.";
