//! Shared test utilities.
//!
//! This module provides common helpers for building dates and records, setting up
//! an in-memory database, opening a ledger with sensible defaults, and a store whose
//! reads can be made to fail.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        leave::{LeaveRecord, LeaveType},
        ledger::{LeaveLedger, LedgerDefaults},
    },
    errors::{Error, Result},
    storage::{KeyValueStore, MemoryStore},
};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date; panics on impossible dates.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a record with sensible defaults.
///
/// # Defaults
/// * `reason`: empty
/// * `attachment_name`: None
/// * `created_at`: 2025-04-01 09:00 UTC
pub fn record(id: &str, leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveRecord {
    LeaveRecord {
        id: id.into(),
        start_date: start,
        end_date: end,
        leave_type,
        reason: String::new(),
        attachment_name: None,
        created_at: Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
    }
}

/// Opens a ledger over an empty in-memory store with the built-in defaults.
pub async fn open_memory_ledger() -> LeaveLedger<MemoryStore> {
    LeaveLedger::open(MemoryStore::new(), LedgerDefaults::default()).await
}

/// Wraps a `MemoryStore` and fails every read of the listed keys.
///
/// Writes always go through. Clear the set from `unreadable_keys` to heal reads.
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    unreadable: Arc<Mutex<HashSet<String>>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, keys: &[&str]) -> Self {
        Self {
            inner,
            unreadable: Arc::new(Mutex::new(keys.iter().map(ToString::to_string).collect())),
        }
    }

    /// Shared handle to the failing key set.
    pub fn unreadable_keys(&self) -> Arc<Mutex<HashSet<String>>> {
        Arc::clone(&self.unreadable)
    }
}

impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.unreadable.lock().unwrap().contains(key) {
            return Err(Error::Persistence {
                message: format!("read of '{key}' failed"),
            });
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}
