//! Rail stub: an append-only audit line per packet handed to the rail.
//!
//! Line format: `<UTC timestamp>Z | <order_id> | <packet_hash>`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use govgate_types::{GatewayError, OrderId, Result, constants};

/// One audit line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RailEntry {
    pub sent_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub packet_hash: String,
}

impl RailEntry {
    /// The line as written, without the trailing newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{}Z | {} | {}",
            self.sent_at.format("%Y-%m-%dT%H:%M:%S%.6f"),
            self.order_id,
            self.packet_hash
        )
    }
}

/// Append-only log file under the log directory.
#[derive(Debug, Clone)]
pub struct RailLog {
    path: PathBuf,
}

impl RailLog {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `rail_stub.log` inside `log_dir`.
    #[must_use]
    pub fn in_dir(log_dir: impl AsRef<Path>) -> Self {
        Self::new(log_dir.as_ref().join(constants::RAIL_LOG_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &RailEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GatewayError::storage(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GatewayError::storage(&self.path, e))?;
        writeln!(file, "{}", entry.to_line()).map_err(|e| GatewayError::storage(&self.path, e))
    }

    /// All lines written so far. A missing log reads as empty.
    pub fn lines(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(GatewayError::storage(&self.path, e)),
        }
    }
}
