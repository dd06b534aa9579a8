//! Inventory store collaborators.
//!
//! The engine never talks to a database or HTTP API directly. Callers hand it
//! an [`InventoryReader`] to take a snapshot and an [`InventoryWriter`] for
//! remediation writes.

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::error::ReconError;
use crate::model::{InventoryRecord, Status};

/// Failure reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StoreError {}

pub trait InventoryReader {
    /// All records for a store/location scope. May be empty.
    fn list_records(&self, scope: &str) -> Result<Vec<InventoryRecord>, StoreError>;
}

pub trait InventoryWriter {
    fn update_status(&self, record_id: &str, status: Status, note: &str) -> Result<(), StoreError>;
}

/// Fetch a snapshot, mapping store failures into the engine taxonomy.
pub fn fetch_snapshot(
    reader: &dyn InventoryReader,
    scope: &str,
) -> Result<Vec<InventoryRecord>, ReconError> {
    reader
        .list_records(scope)
        .map_err(|e| ReconError::ExternalFetchFailure(e.message))
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store backed by a `Vec`, used for offline snapshot files and tests.
///
/// Scope is ignored. Writes update the held records in place.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    records: RefCell<Vec<InventoryRecord>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryInventory {
    pub fn new(records: Vec<InventoryRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful status writes.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn records(&self) -> Vec<InventoryRecord> {
        self.records.borrow().clone()
    }

    pub fn status_of(&self, record_id: &str) -> Option<Status> {
        self.records.borrow().iter().find(|r| r.id == record_id).map(|r| r.status)
    }
}

impl InventoryReader for MemoryInventory {
    fn list_records(&self, _scope: &str) -> Result<Vec<InventoryRecord>, StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::new("inventory store unavailable"));
        }
        Ok(self.records())
    }
}

impl InventoryWriter for MemoryInventory {
    fn update_status(&self, record_id: &str, status: Status, _note: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::new("write rejected"));
        }
        let mut records = self.records.borrow_mut();
        let rec = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| StoreError::new(format!("no record with id '{record_id}'")))?;
        rec.status = status;
        rec.updated_at = Some(chrono::Utc::now());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_updates_in_place() {
        let store = MemoryInventory::new(vec![InventoryRecord::new("1", "111", Status::Available)]);
        store.update_status("1", Status::Lost, "shelf check").unwrap();
        assert_eq!(store.status_of("1"), Some(Status::Lost));
        assert_eq!(store.write_count(), 1);
        assert!(store.records()[0].updated_at.is_some());
    }

    #[test]
    fn memory_store_unknown_id_fails() {
        let store = MemoryInventory::new(vec![]);
        let err = store.update_status("nope", Status::Lost, "").unwrap_err();
        assert!(err.message.contains("nope"));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn fetch_failure_maps_to_external_fetch() {
        let store = MemoryInventory::new(vec![]);
        store.set_fail_reads(true);
        let err = fetch_snapshot(&store, "main").unwrap_err();
        assert!(matches!(err, ReconError::ExternalFetchFailure(_)));
    }
}
