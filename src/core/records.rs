//! Record store - the canonical, insertion-ordered list of leave records.
//!
//! The store does not validate date ranges; callers run `LeaveDraft::validate`
//! before records get here. Every read hands out an owned copy.

use crate::{
    core::leave::{LeaveId, LeaveRecord},
    errors::{Error, Result},
};

/// In-memory list of leave records, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<LeaveRecord>,
}

impl RecordStore {
    /// Builds a store from an existing list, keeping its order.
    #[must_use]
    pub const fn from_records(records: Vec<LeaveRecord>) -> Self {
        Self { records }
    }

    /// Appends a record. Fails with `DuplicateId` if the id is already present.
    pub fn add(&mut self, record: LeaveRecord) -> Result<Vec<LeaveRecord>> {
        if self.contains(&record.id) {
            return Err(Error::DuplicateId {
                id: record.id.to_string(),
            });
        }

        self.records.push(record);
        Ok(self.list())
    }

    /// Replaces the record with the same id, keeping the original `created_at`.
    ///
    /// An unknown id leaves the store untouched and still returns the full list.
    pub fn update(&mut self, record: LeaveRecord) -> Vec<LeaveRecord> {
        self.replace(record);
        self.list()
    }

    /// Removes the record with `id`; unknown ids are ignored.
    pub fn remove(&mut self, id: &LeaveId) -> Vec<LeaveRecord> {
        self.take(id);
        self.list()
    }

    /// Copy of the current list.
    #[must_use]
    pub fn list(&self) -> Vec<LeaveRecord> {
        self.records.clone()
    }

    /// Read-only view of the records, for queries that do not need ownership.
    #[must_use]
    pub fn as_slice(&self) -> &[LeaveRecord] {
        &self.records
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: &LeaveId) -> Option<&LeaveRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Whether a record with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &LeaveId) -> bool {
        self.get(id).is_some()
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replaces the whole list.
    pub fn replace_all(&mut self, records: Vec<LeaveRecord>) {
        self.records = records;
    }

    /// Replaces the matching record in place. Returns whether one matched.
    pub(crate) fn replace(&mut self, mut record: LeaveRecord) -> bool {
        let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) else {
            return false;
        };

        record.created_at = existing.created_at;
        *existing = record;
        true
    }

    /// Removes and returns the matching record.
    pub(crate) fn take(&mut self, id: &LeaveId) -> Option<LeaveRecord> {
        let index = self.records.iter().position(|r| &r.id == id)?;
        Some(self.records.remove(index))
    }
}
