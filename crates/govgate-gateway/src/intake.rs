//! Upload intake: accept one PDF, store it, describe it as a new order.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use govgate_packet::export::write_atomic;
use govgate_types::{GatewayConfig, GatewayError, OrderId, OrderRecord, Result, constants};
use tracing::info;

/// Reduce a client-supplied filename to a safe, flat name.
///
/// Directory components are dropped, whitespace runs become `_`, only ASCII
/// alphanumerics and `._-` survive, and leading dots or underscores are
/// stripped. May return an empty string.
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_start_matches(['.', '_']).to_string()
}

fn has_accepted_ext(name: &str) -> bool {
    name.to_ascii_lowercase()
        .ends_with(constants::ACCEPTED_UPLOAD_EXT)
}

/// Validates and stores uploaded documents.
#[derive(Debug, Clone)]
pub struct UploadIntake {
    upload_dir: PathBuf,
    max_bytes: u64,
}

impl UploadIntake {
    #[must_use]
    pub fn new(upload_dir: impl AsRef<Path>, max_bytes: u64) -> Self {
        Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
            max_bytes,
        }
    }

    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(&config.upload_dir, config.max_upload_bytes)
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Check `filename` and `contents` without writing anything.
    ///
    /// Returns the sanitized filename.
    pub fn check(&self, filename: &str, contents: &[u8]) -> Result<String> {
        let reject = |reason: &str| GatewayError::InvalidUpload {
            reason: reason.to_string(),
        };
        if filename.trim().is_empty() {
            return Err(reject("empty filename"));
        }
        if !has_accepted_ext(filename) {
            return Err(reject("only PDF uploads are supported"));
        }
        let clean = sanitize_filename(filename);
        if clean.is_empty() || !has_accepted_ext(&clean) {
            return Err(reject("filename has no usable characters"));
        }
        if contents.is_empty() {
            return Err(reject("empty document"));
        }
        let size = u64::try_from(contents.len()).unwrap_or(u64::MAX);
        if size > self.max_bytes {
            return Err(GatewayError::InvalidUpload {
                reason: format!("document is {size} bytes, limit is {}", self.max_bytes),
            });
        }
        Ok(clean)
    }

    /// Store the document under a fresh order id and return the new,
    /// unfinalized record. The caller persists the record.
    pub fn accept(
        &self,
        filename: &str,
        contents: &[u8],
        now: DateTime<Utc>,
    ) -> Result<OrderRecord> {
        let clean = self.check(filename, contents)?;
        let order_id = OrderId::generate();
        let stored_filename = format!("{order_id}_{clean}");
        let path = self.upload_dir.join(&stored_filename);

        std::fs::create_dir_all(&self.upload_dir)
            .map_err(|e| GatewayError::storage(&self.upload_dir, e))?;
        write_atomic(&path, contents)?;
        let size_bytes = std::fs::metadata(&path)
            .map_err(|e| GatewayError::storage(&path, e))?
            .len();

        info!(
            order_id = %order_id,
            filename = %clean,
            size_bytes,
            "upload accepted"
        );
        Ok(OrderRecord::new(
            order_id,
            clean,
            stored_filename,
            constants::DEFAULT_UPLOAD_MIME,
            size_bytes,
            now,
        ))
    }
}
