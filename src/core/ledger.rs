//! The authoritative set of occupied slots.
//!
//! The ledger does no locking of its own; `LotAllocator` keeps it behind a
//! single `RwLock` and is the only writer. Counter drift is a lock
//! discipline bug, so every mutation asserts the invariants instead of
//! repairing them.

use std::collections::{HashMap, HashSet};

use super::record::OccupancyRecord;

/// Why an insertion was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertRefusal {
    /// The resource already holds a slot.
    Duplicate,
    /// Every slot is taken.
    Full,
}

/// Occupied records keyed by resource id, plus the occupancy counter.
#[derive(Debug)]
pub(crate) struct Ledger {
    capacity: usize,
    occupied: usize,
    records: HashMap<String, OccupancyRecord>,
}

impl Ledger {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            occupied: 0,
            records: HashMap::with_capacity(capacity.min(4096)),
        }
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) const fn occupied(&self) -> usize {
        self.occupied
    }

    pub(crate) const fn available(&self) -> usize {
        self.capacity - self.occupied
    }

    pub(crate) fn contains(&self, resource_id: &str) -> bool {
        self.records.contains_key(resource_id)
    }

    pub(crate) fn get(&self, resource_id: &str) -> Option<&OccupancyRecord> {
        self.records.get(resource_id)
    }

    pub(crate) fn resource_ids(&self) -> HashSet<String> {
        self.records.keys().cloned().collect()
    }

    /// Insert an admitted record. Duplicate identity wins over a full lot.
    pub(crate) fn try_insert(&mut self, record: OccupancyRecord) -> Result<(), InsertRefusal> {
        if self.records.contains_key(record.resource_id()) {
            return Err(InsertRefusal::Duplicate);
        }
        if self.occupied >= self.capacity {
            return Err(InsertRefusal::Full);
        }

        self.records.insert(record.resource_id().to_owned(), record);
        self.occupied += 1;

        assert!(
            self.occupied <= self.capacity,
            "occupancy {} exceeds capacity {}",
            self.occupied,
            self.capacity
        );
        self.assert_consistent();
        Ok(())
    }

    /// Remove a record, returning it if it was present.
    pub(crate) fn remove(&mut self, resource_id: &str) -> Option<OccupancyRecord> {
        let record = self.records.remove(resource_id)?;

        assert!(self.occupied > 0, "occupancy underflow releasing {resource_id}");
        self.occupied -= 1;
        self.assert_consistent();
        Some(record)
    }

    fn assert_consistent(&self) {
        assert_eq!(
            self.occupied,
            self.records.len(),
            "occupancy counter out of step with ledger contents"
        );
    }
}
