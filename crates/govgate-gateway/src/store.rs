//! Order record persistence.
//!
//! The store is the sole owner of [`OrderRecord`]s. Callers get copies and
//! write back whole records (`set`) or typed partial updates (`update`).
//! There is no compare-and-set: one writer per order id at a time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use govgate_packet::export::write_atomic;
use govgate_types::{GatewayError, OrderId, OrderPatch, OrderRecord, Result};
use tracing::{debug, warn};

/// Key-value persistence of order records keyed by order id.
pub trait OrderStore {
    /// The record for `order_id`, if any.
    fn get(&self, order_id: &OrderId) -> Result<Option<OrderRecord>>;

    /// Insert or replace the record. Durable once this returns `Ok`.
    fn set(&mut self, order_id: &OrderId, record: OrderRecord) -> Result<()>;

    /// Every stored order id, sorted.
    fn order_ids(&self) -> Result<Vec<OrderId>>;

    /// Read-modify-write merge of `patch` into an existing record.
    ///
    /// # Errors
    /// - [`GatewayError::OrderNotFound`] if there is no such record
    /// - [`GatewayError::InconsistentRecord`] if the merged record breaks the
    ///   `finalized <=> packet` invariant (nothing is written)
    fn update(&mut self, order_id: &OrderId, patch: OrderPatch) -> Result<OrderRecord> {
        let mut record = self
            .get(order_id)?
            .ok_or_else(|| GatewayError::OrderNotFound(order_id.clone()))?;
        record.apply(patch)?;
        self.set(order_id, record.clone())?;
        Ok(record)
    }
}

fn check_key(order_id: &OrderId, record: &OrderRecord) -> Result<()> {
    if &record.order_id != order_id {
        return Err(GatewayError::InconsistentRecord {
            order_id: order_id.clone(),
            reason: format!("record carries order id {}", record.order_id),
        });
    }
    record.validate()
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryOrderStore {
    records: BTreeMap<OrderId, OrderRecord>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl OrderStore for MemoryOrderStore {
    fn get(&self, order_id: &OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.records.get(order_id).cloned())
    }

    fn set(&mut self, order_id: &OrderId, record: OrderRecord) -> Result<()> {
        check_key(order_id, &record)?;
        self.records.insert(order_id.clone(), record);
        Ok(())
    }

    fn order_ids(&self) -> Result<Vec<OrderId>> {
        Ok(self.records.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// One pretty-printed JSON object `{ order_id: record }` on disk.
///
/// Every `set` rewrites the whole file through a synced temp file and a
/// rename, so a reader never sees a half-written store. A file that does not
/// parse is reported, never treated as empty.
#[derive(Debug, Clone)]
pub struct JsonFileOrderStore {
    path: PathBuf,
}

impl JsonFileOrderStore {
    /// Open (creating the parent directory if needed). The file itself is
    /// created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GatewayError::storage(parent, e))?;
        }
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<OrderId, OrderRecord>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(GatewayError::storage(&self.path, e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "order store is unreadable");
            GatewayError::storage(&self.path, format!("corrupt order store: {e}"))
        })
    }

    fn write_all(&self, records: &BTreeMap<OrderId, OrderRecord>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        write_atomic(&self.path, &bytes)
    }
}

impl OrderStore for JsonFileOrderStore {
    fn get(&self, order_id: &OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.read_all()?.remove(order_id))
    }

    fn set(&mut self, order_id: &OrderId, record: OrderRecord) -> Result<()> {
        check_key(order_id, &record)?;
        let mut records = self.read_all()?;
        records.insert(order_id.clone(), record);
        self.write_all(&records)?;
        debug!(order_id = %order_id, path = %self.path.display(), "order record stored");
        Ok(())
    }

    fn order_ids(&self) -> Result<Vec<OrderId>> {
        Ok(self.read_all()?.into_keys().collect())
    }
}
