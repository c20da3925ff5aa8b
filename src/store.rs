//! JSON file-backed order history.
//!
//! The whole collection lives in one pretty-printed JSON array and is
//! rewritten on every mutation. Writes go to a `.tmp` sibling first and are
//! renamed into place, so a failed write leaves the previous file intact.
//!
//! Appends and status updates are read-modify-write cycles. They are
//! serialized within a process by an internal lock; separate processes
//! sharing one history file must not write concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use log::{debug, info, warn};

use crate::error::StoreError;
use crate::record::{NewOrder, OrderRecord};
use crate::stats::HistoryStats;
use crate::status::OrderStatus;
use crate::types::{Action, InstrumentType};

/// Search criteria. `None` fields match everything; supplied fields are ANDed.
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    pub symbol: Option<String>,
    pub instrument_type: Option<InstrumentType>,
    pub action: Option<Action>,
}

impl RecordFilter {
    pub fn matches(&self, record: &OrderRecord) -> bool {
        let symbol_ok = self
            .symbol
            .as_deref()
            .is_none_or(|s| record.draft.symbol().eq_ignore_ascii_case(s.trim()));
        let type_ok = self
            .instrument_type
            .is_none_or(|t| record.draft.instrument.instrument_type() == t);
        let action_ok = self.action.is_none_or(|a| record.draft.action == a);
        symbol_ok && type_ok && action_ok
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// Append-by-id order history persisted as a single JSON document.
#[derive(Debug)]
pub struct OrderStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OrderStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a new record and return its id.
    pub fn append(&self, order: NewOrder) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.read_strict()?;

        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        records.push(OrderRecord {
            id,
            timestamp: Utc::now(),
            draft: order.draft,
            outcome: order.outcome,
            updated_at: None,
        });

        self.write_all(&records)?;
        info!("Order #{id} saved to history");
        Ok(id)
    }

    /// All records in insertion order. Missing or unreadable history is empty.
    pub fn load_all(&self) -> Vec<OrderRecord> {
        match self.read_strict() {
            Ok(records) => records,
            Err(e) => {
                warn!("Error loading order history: {e}");
                Vec::new()
            }
        }
    }

    pub fn find_by_id(&self, id: u64) -> Option<OrderRecord> {
        self.load_all().into_iter().find(|r| r.id == id)
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<OrderRecord> {
        self.load_all()
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect()
    }

    /// The last `limit` records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<OrderRecord> {
        let records = self.load_all();
        let skip = records.len().saturating_sub(limit);
        records.into_iter().skip(skip).collect()
    }

    /// Records whose cached status is neither terminal nor a failure.
    ///
    /// This is an offline view; the live gateway is the authority on what is
    /// actually pending.
    pub fn open_records(&self) -> Vec<OrderRecord> {
        self.load_all()
            .into_iter()
            .filter(|r| r.status().is_some_and(|s| !s.is_terminal()))
            .collect()
    }

    pub fn statistics(&self) -> HistoryStats {
        HistoryStats::from_records(&self.load_all())
    }

    /// Set `status` and `updated_at` on one record. Returns `Ok(false)` if the
    /// id is unknown, in which case nothing is written.
    pub fn update_status(&self, id: u64, status: OrderStatus) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.read_strict()?;

        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            debug!("update_status: order #{id} not in history");
            return Ok(false);
        };
        debug!(
            "Order #{id}: {} -> {status}",
            record
                .outcome
                .status
                .as_ref()
                .map_or("-", |s| s.as_str())
        );
        record.outcome.status = Some(status);
        record.updated_at = Some(Utc::now());

        self.write_all(&records)?;
        Ok(true)
    }

    fn read_strict(&self) -> Result<Vec<OrderRecord>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.path)(e)),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write_all(&self, records: &[OrderRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(io_err(&tmp_path))?;

        fs::rename(&tmp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Replace {
                tmp: tmp_path.clone(),
                path: self.path.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SubmissionOutcome;
    use crate::types::{BrokerOrderId, Instrument, OrderDraft, OrderKind};

    fn eurusd_limit() -> NewOrder {
        NewOrder {
            draft: OrderDraft::new(
                Instrument::forex("EURUSD"),
                Action::Buy,
                10_000.0,
                OrderKind::Limit { limit_price: 1.08 },
            ),
            outcome: SubmissionOutcome::acknowledged(
                BrokerOrderId(42),
                OrderStatus::broker("Submitted"),
            ),
        }
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::open(dir.path().join("none.json"));
        assert!(store.load_all().is_empty());
        assert!(store.find_by_id(1).is_none());
    }

    #[test]
    fn append_assigns_sequential_ids_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::open(dir.path().join("data").join("history.json"));

        assert_eq!(store.append(eurusd_limit()).unwrap(), 1);
        assert_eq!(store.append(eurusd_limit()).unwrap(), 2);
        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_reads_empty_but_blocks_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[{ not json").unwrap();

        let store = OrderStore::open(&path);
        assert!(store.load_all().is_empty());
        assert!(matches!(
            store.append(eurusd_limit()),
            Err(StoreError::Corrupt { .. })
        ));
        // Original bytes are untouched.
        assert_eq!(fs::read_to_string(&path).unwrap(), "[{ not json");
    }

    #[test]
    fn failed_write_names_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = OrderStore::open(&path);
        store.append(eurusd_limit()).unwrap();
        let tmp = dir.path().join("history.json.tmp");
        fs::create_dir(&tmp).unwrap();

        match store.append(eurusd_limit()) {
            Err(StoreError::Io { path: failed, .. }) => assert_eq!(failed, tmp),
            other => panic!("expected Io error on the temp file, got {other:?}"),
        }
        assert_eq!(store.load_all().len(), 1);
    }

    #[test]
    fn unreadable_history_names_the_history_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::create_dir(&path).unwrap();
        let store = OrderStore::open(&path);

        match store.append(eurusd_limit()) {
            Err(StoreError::Io { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected Io error on the history file, got {other:?}"),
        }
        assert!(!dir.path().join("history.json.tmp").exists());
    }

    #[test]
    fn update_unknown_id_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::open(dir.path().join("history.json"));
        assert!(!store.update_status(9, OrderStatus::broker("Filled")).unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn recent_keeps_tail() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::open(dir.path().join("history.json"));
        for _ in 0..5 {
            store.append(eurusd_limit()).unwrap();
        }
        let ids: Vec<u64> = store.recent(2).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(store.recent(50).len(), 5);
    }
}
