//! Leave ledger - the store object the application constructs once and passes around.
//!
//! The ledger owns the record list, the reconciled quotas and the metadata side-map,
//! and writes each change through a `KeyValueStore`. A mutation is applied in memory
//! and quotas are reconciled before the write is attempted. When the write fails the
//! in-memory state stands, the ledger is marked degraded (in-memory only) and the
//! failure is returned as a warning on the `Snapshot`.
//!
//! A key that could not be read at open is never written afterwards: memory holds
//! defaults for it, and writing them would replace data the ledger never saw.

use crate::{
    core::{
        backup::{ExportDocument, parse_import},
        calendar,
        leave::{LeaveDraft, LeaveId, LeaveRecord, LeaveType},
        metadata::{LeaveMetadata, MetadataMap},
        quota::{LeaveQuota, default_quotas, reconcile},
        records::RecordStore,
    },
    errors::{Error, Result},
    storage::{
        CURRENT_DATA_VERSION, DATA_VERSION_KEY, KeyValueStore, METADATA_KEY, QUOTAS_KEY,
        RECORDS_KEY,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::mem;
use tracing::{debug, error, info, instrument, warn};

/// Values used when a key is absent or unreadable.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerDefaults {
    /// Quota set seeded on first run and restored by `reset_quotas`
    pub quotas: Vec<LeaveQuota>,
    /// Records seeded on first run
    pub records: Vec<LeaveRecord>,
}

impl Default for LedgerDefaults {
    fn default() -> Self {
        Self {
            quotas: default_quotas(),
            records: Vec::new(),
        }
    }
}

/// State after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Full record list
    pub records: Vec<LeaveRecord>,
    /// Reconciled quotas
    pub quotas: Vec<LeaveQuota>,
    /// Set when the change could not be written to durable storage
    pub warning: Option<String>,
}

impl Snapshot {
    /// Whether the change reached durable storage.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }
}

/// Outcome of reading one key during `open`.
enum Loaded<T> {
    Stored(T),
    Absent,
    Corrupt,
    Unreadable,
}

/// The separately persisted parts of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Records,
    Quotas,
    Metadata,
}

impl Slot {
    const fn key(self) -> &'static str {
        match self {
            Self::Records => RECORDS_KEY,
            Self::Quotas => QUOTAS_KEY,
            Self::Metadata => METADATA_KEY,
        }
    }
}

/// The leave ledger.
#[derive(Debug)]
pub struct LeaveLedger<S> {
    storage: S,
    records: RecordStore,
    quotas: Vec<LeaveQuota>,
    metadata: MetadataMap,
    defaults: LedgerDefaults,
    degraded: bool,
    /// Slots whose stored value could not be read; writes to them are withheld
    unread: Vec<Slot>,
}

impl<S: KeyValueStore> LeaveLedger<S> {
    /// Loads the ledger from `storage`.
    ///
    /// Absent keys are seeded with `defaults` and written immediately. Unparseable
    /// values are logged, left untouched in storage, and replaced by the defaults in
    /// memory. Read failures also fall back to the defaults, mark the ledger degraded,
    /// and keep that key from being written for the rest of the session.
    #[instrument(skip(storage, defaults))]
    pub async fn open(storage: S, defaults: LedgerDefaults) -> Self {
        let mut ledger = Self {
            storage,
            records: RecordStore::default(),
            quotas: Vec::new(),
            metadata: MetadataMap::default(),
            defaults,
            degraded: false,
            unread: Vec::new(),
        };

        ledger.ensure_data_version().await;

        let (records, seed_records) = match ledger.load::<Vec<LeaveRecord>>(RECORDS_KEY).await {
            Loaded::Stored(records) => (records, false),
            Loaded::Absent => (ledger.defaults.records.clone(), true),
            Loaded::Corrupt => (ledger.defaults.records.clone(), false),
            Loaded::Unreadable => {
                ledger.unread.push(Slot::Records);
                (ledger.defaults.records.clone(), false)
            }
        };
        ledger.records = RecordStore::from_records(records);
        if seed_records {
            info!(
                "Seeding '{}' with {} default records",
                RECORDS_KEY,
                ledger.records.len()
            );
            ledger.persist(Slot::Records).await;
        }

        let (quotas, seed_quotas) = match ledger.load::<Vec<LeaveQuota>>(QUOTAS_KEY).await {
            Loaded::Stored(quotas) => (quotas, false),
            Loaded::Absent => (ledger.defaults.quotas.clone(), true),
            Loaded::Corrupt => (ledger.defaults.quotas.clone(), false),
            Loaded::Unreadable => {
                ledger.unread.push(Slot::Quotas);
                (ledger.defaults.quotas.clone(), false)
            }
        };
        ledger.quotas = reconcile(ledger.records.as_slice(), &quotas);
        if seed_quotas {
            info!("Seeding '{}' with default quotas", QUOTAS_KEY);
            ledger.persist(Slot::Quotas).await;
        }

        ledger.metadata = match ledger.load::<MetadataMap>(METADATA_KEY).await {
            Loaded::Stored(metadata) => metadata,
            Loaded::Absent | Loaded::Corrupt => MetadataMap::default(),
            Loaded::Unreadable => {
                ledger.unread.push(Slot::Metadata);
                MetadataMap::default()
            }
        };

        info!(
            "Leave ledger opened with {} records and {} quotas",
            ledger.records.len(),
            ledger.quotas.len()
        );
        ledger
    }

    /// Copy of the record list, in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<LeaveRecord> {
        self.records.list()
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn record(&self, id: &LeaveId) -> Option<&LeaveRecord> {
        self.records.get(id)
    }

    /// Reconciled quotas, in configuration order.
    #[must_use]
    pub fn quotas(&self) -> &[LeaveQuota] {
        &self.quotas
    }

    /// Records covering `date`.
    #[must_use]
    pub fn leaves_on(&self, date: NaiveDate) -> Vec<&LeaveRecord> {
        calendar::leaves_on(self.records.as_slice(), date)
    }

    /// Extras stored for a record.
    #[must_use]
    pub fn metadata(&self, id: &LeaveId) -> Option<&LeaveMetadata> {
        self.metadata.get(id)
    }

    /// Whether a read or write failed and durable storage may differ from memory.
    ///
    /// Every `Snapshot` taken while degraded carries a warning.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Adds a record as given. The record's date range is not re-validated.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn add(&mut self, record: LeaveRecord) -> Result<Snapshot> {
        self.records.add(record)?;
        self.quotas = reconcile(self.records.as_slice(), &self.quotas);

        let warning = self.persist_records().await;
        Ok(self.snapshot(warning))
    }

    /// Validates `draft`, assigns a fresh id and creation time, and adds it.
    pub async fn submit(&mut self, draft: LeaveDraft, now: DateTime<Utc>) -> Result<Snapshot> {
        let record = draft.into_record(LeaveId::generate(), now)?;
        self.add(record).await
    }

    /// Replaces the record with the same id, keeping its `created_at`.
    ///
    /// An unknown id changes nothing, writes nothing, and returns the current state.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn update(&mut self, record: LeaveRecord) -> Snapshot {
        if !self.records.replace(record) {
            debug!("Update targeted an unknown id; nothing changed");
            return self.snapshot(None);
        }
        self.quotas = reconcile(self.records.as_slice(), &self.quotas);

        let warning = self.persist_records().await;
        self.snapshot(warning)
    }

    /// Validates `draft` and applies it to the record `id`.
    ///
    /// An unknown id is a no-op, as with `update`.
    pub async fn edit(&mut self, id: &LeaveId, draft: LeaveDraft) -> Result<Snapshot> {
        let Some(existing) = self.records.get(id) else {
            draft.validate()?;
            debug!("Edit targeted unknown id {}; nothing changed", id);
            return Ok(self.snapshot(None));
        };

        let record = draft.into_record(id.clone(), existing.created_at)?;
        Ok(self.update(record).await)
    }

    /// Removes the record `id` and its metadata. Unknown ids are ignored.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, id: &LeaveId) -> Snapshot {
        if self.records.take(id).is_none() {
            debug!("Remove targeted an unknown id; nothing changed");
            return self.snapshot(None);
        }
        self.quotas = reconcile(self.records.as_slice(), &self.quotas);

        let mut warning = self.persist_records().await;
        if self.metadata.remove_record(id) {
            let metadata_warning = self.persist(Slot::Metadata).await;
            warning = warning.or(metadata_warning);
        }
        self.snapshot(warning)
    }

    /// Sets the allowance for `leave_type`. `used` is unaffected.
    #[instrument(skip(self))]
    pub async fn set_quota_total(&mut self, leave_type: LeaveType, total: f64) -> Result<Snapshot> {
        if !total.is_finite() || total < 0.0 {
            return Err(Error::Validation {
                message: format!("quota total must be a non-negative number, got {total}"),
            });
        }

        let quota = self
            .quotas
            .iter_mut()
            .find(|q| q.leave_type == leave_type)
            .ok_or(Error::QuotaNotFound { leave_type })?;
        quota.total = total;

        let warning = self.persist(Slot::Quotas).await;
        Ok(self.snapshot(warning))
    }

    /// Restores the configured default quotas, reconciled against current records.
    pub async fn reset_quotas(&mut self) -> Snapshot {
        info!("Resetting quotas to defaults");
        self.quotas = reconcile(self.records.as_slice(), &self.defaults.quotas);

        let warning = self.persist(Slot::Quotas).await;
        self.snapshot(warning)
    }

    /// Sets one metadata field on an existing record; `null` clears it.
    pub async fn set_metadata(&mut self, id: &LeaveId, key: &str, value: Value) -> Result<Snapshot> {
        if !self.records.contains(id) {
            return Err(Error::LeaveNotFound { id: id.to_string() });
        }

        self.metadata.set(id, key, value);
        let warning = self.persist(Slot::Metadata).await;
        Ok(self.snapshot(warning))
    }

    /// Full export of the record list with optional opaque settings.
    #[must_use]
    pub fn export(&self, settings: Option<Value>, now: DateTime<Utc>) -> ExportDocument {
        ExportDocument {
            version: CURRENT_DATA_VERSION.to_string(),
            timestamp: now,
            records: self.records.list(),
            settings,
        }
    }

    /// Replaces the whole record list with the one in `raw`.
    ///
    /// The document is validated completely first; on any problem nothing changes.
    #[instrument(skip(self, raw))]
    pub async fn import(&mut self, raw: &str) -> Result<Snapshot> {
        let document = parse_import(raw).inspect_err(|e| warn!("Import rejected: {}", e))?;

        if let Some(duplicate) = first_duplicate_id(&document.records) {
            return Err(Error::ImportFormat {
                message: format!("duplicate record id '{duplicate}'"),
            });
        }
        if document.version != CURRENT_DATA_VERSION {
            info!(
                "Importing document written with data version {} (current {})",
                document.version, CURRENT_DATA_VERSION
            );
        }

        self.records.replace_all(document.records);
        self.quotas = reconcile(self.records.as_slice(), &self.quotas);
        info!("Imported {} records", self.records.len());

        let mut warning = self.persist_records().await;
        let before = self.metadata.entries.len();
        let records = &self.records;
        self.metadata.retain(|id| records.contains(id));
        if self.metadata.entries.len() != before {
            let metadata_warning = self.persist(Slot::Metadata).await;
            warning = warning.or(metadata_warning);
        }
        Ok(self.snapshot(warning))
    }

    /// Rewrites every key from memory. Clears the degraded flag on success.
    ///
    /// Fails without writing anything while a key that could not be read at open
    /// still holds (or may hold) data; reopen the ledger to load it instead.
    pub async fn flush(&mut self) -> Result<()> {
        self.check_unread().await?;

        for slot in [Slot::Records, Slot::Quotas, Slot::Metadata] {
            self.store(slot).await?;
        }
        self.storage
            .set(DATA_VERSION_KEY, CURRENT_DATA_VERSION)
            .await?;

        if self.degraded {
            info!("Storage caught up with memory; leaving in-memory-only mode");
        }
        self.degraded = false;
        Ok(())
    }

    /// Consumes the ledger and returns its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn snapshot(&self, warning: Option<String>) -> Snapshot {
        let warning = warning.or_else(|| {
            self.degraded.then(|| {
                "Storage is out of step with memory; changes are kept in memory only".to_string()
            })
        });
        Snapshot {
            records: self.records.list(),
            quotas: self.quotas.clone(),
            warning,
        }
    }

    /// Re-reads every unread slot. A slot that is now readable and empty is released;
    /// one still failing or holding data this session never loaded is an error.
    async fn check_unread(&mut self) -> Result<()> {
        let mut still_unread = Vec::new();
        let mut failure = None;
        for slot in mem::take(&mut self.unread) {
            let problem = match self.storage.get(slot.key()).await {
                Ok(None) => {
                    debug!("'{}' is empty now; it may be written", slot.key());
                    continue;
                }
                Ok(Some(_)) => Error::Persistence {
                    message: format!(
                        "'{}' holds data this session never loaded; reopen the ledger",
                        slot.key()
                    ),
                },
                Err(e) => e,
            };
            still_unread.push(slot);
            if failure.is_none() {
                failure = Some(problem);
            }
        }
        self.unread = still_unread;
        failure.map_or(Ok(()), Err)
    }

    /// Writes the data version on first run; an existing current version is left alone.
    async fn ensure_data_version(&mut self) {
        match self.storage.get(DATA_VERSION_KEY).await {
            Ok(Some(version)) if version == CURRENT_DATA_VERSION => {
                debug!("Data version {} is current", version);
            }
            Ok(Some(version)) => {
                // No migrations exist yet; every earlier layout reads as-is.
                warn!(
                    "Stored data version {} differs from {}; recording current version",
                    version, CURRENT_DATA_VERSION
                );
                self.write_raw(DATA_VERSION_KEY, CURRENT_DATA_VERSION).await;
            }
            Ok(None) => {
                info!("Recording data version {}", CURRENT_DATA_VERSION);
                self.write_raw(DATA_VERSION_KEY, CURRENT_DATA_VERSION).await;
            }
            Err(e) => {
                error!("Failed to read data version: {}", e);
                self.degraded = true;
            }
        }
    }

    /// Writes the record list and the quotas reconciled against it.
    async fn persist_records(&mut self) -> Option<String> {
        let warning = self.persist(Slot::Records).await;
        let quota_warning = self.persist(Slot::Quotas).await;
        warning.or(quota_warning)
    }

    async fn load<T: DeserializeOwned>(&mut self, key: &str) -> Loaded<T> {
        match self.storage.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Loaded::Stored(value),
                Err(e) => {
                    error!("Stored value for '{}' is corrupt, using defaults: {}", key, e);
                    Loaded::Corrupt
                }
            },
            Ok(None) => Loaded::Absent,
            Err(e) => {
                error!("Failed to read '{}', using defaults: {}", key, e);
                self.degraded = true;
                Loaded::Unreadable
            }
        }
    }

    /// Serializes one slot and writes it. An empty metadata map removes its key.
    async fn store(&self, slot: Slot) -> Result<()> {
        let raw = match slot {
            Slot::Records => serde_json::to_string(self.records.as_slice())?,
            Slot::Quotas => serde_json::to_string(&self.quotas)?,
            Slot::Metadata if self.metadata.entries.is_empty() => {
                return self.storage.remove(slot.key()).await;
            }
            Slot::Metadata => serde_json::to_string(&self.metadata)?,
        };
        self.storage.set(slot.key(), &raw).await
    }

    /// Writes one slot, returning a warning instead of failing.
    async fn persist(&mut self, slot: Slot) -> Option<String> {
        if self.unread.contains(&slot) {
            warn!("Not writing '{}'; it could not be read at open", slot.key());
            return Some(format!(
                "Changes are kept in memory only; '{}' could not be read, so it was not overwritten",
                slot.key()
            ));
        }
        match self.store(slot).await {
            Ok(()) => None,
            Err(e) => Some(self.degrade(slot.key(), &e)),
        }
    }

    async fn write_raw(&mut self, key: &str, raw: &str) -> Option<String> {
        match self.storage.set(key, raw).await {
            Ok(()) => None,
            Err(e) => Some(self.degrade(key, &e)),
        }
    }

    fn degrade(&mut self, key: &str, cause: &Error) -> String {
        warn!(
            "Could not persist '{}'; continuing in memory only: {}",
            key, cause
        );
        self.degraded = true;
        format!("Changes are kept in memory only; saving '{key}' failed: {cause}")
    }
}

fn first_duplicate_id(records: &[LeaveRecord]) -> Option<&LeaveId> {
    let mut seen = HashSet::new();
    records.iter().map(|r| &r.id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::quota::find_quota;
    use crate::storage::{MemoryStore, SystemStateStore};
    use crate::test_utils::{FlakyStore, date, open_memory_ledger, record, setup_test_db};
    use serde_json::json;

    fn used(snapshot: &Snapshot, leave_type: LeaveType) -> f64 {
        find_quota(&snapshot.quotas, leave_type).unwrap().used
    }

    #[tokio::test]
    async fn test_first_open_seeds_and_persists_defaults() -> Result<()> {
        let ledger = LeaveLedger::open(MemoryStore::new(), LedgerDefaults::default()).await;
        assert!(ledger.records().is_empty());
        assert_eq!(ledger.quotas().len(), 5);
        assert!(!ledger.is_degraded());

        let storage = ledger.into_storage();
        assert_eq!(storage.get(RECORDS_KEY).await?.as_deref(), Some("[]"));
        assert!(storage.get(QUOTAS_KEY).await?.is_some());
        assert_eq!(
            storage.get(DATA_VERSION_KEY).await?.as_deref(),
            Some(CURRENT_DATA_VERSION)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reopen_is_deterministic() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Sick, date(2025, 4, 5), date(2025, 4, 6)))
            .await?;
        ledger.set_quota_total(LeaveType::Sick, 10.0).await?;

        let reopened = LeaveLedger::open(ledger.into_storage(), LedgerDefaults::default()).await;
        assert_eq!(reopened.records().len(), 1);
        let sick = find_quota(reopened.quotas(), LeaveType::Sick).unwrap();
        assert_eq!(sick.total, 10.0);
        assert_eq!(sick.used, 2.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_records_fall_back_without_overwrite() -> Result<()> {
        let storage = MemoryStore::with_entries([
            (RECORDS_KEY, "{not json"),
            (DATA_VERSION_KEY, CURRENT_DATA_VERSION),
        ]);
        let ledger = LeaveLedger::open(storage, LedgerDefaults::default()).await;

        assert!(ledger.records().is_empty());
        // Corrupt JSON is not a storage failure
        assert!(!ledger.is_degraded());
        let storage = ledger.into_storage();
        assert_eq!(storage.get(RECORDS_KEY).await?.as_deref(), Some("{not json"));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_quotas_fall_back_to_defaults() -> Result<()> {
        let stored = serde_json::to_string(&[record("a", LeaveType::Local, date(2025, 4, 10), date(2025, 4, 11))])?;
        let storage = MemoryStore::with_entries([
            (RECORDS_KEY, stored.as_str()),
            (QUOTAS_KEY, "[{\"type\": \"local\"}]"),
        ]);
        let ledger = LeaveLedger::open(storage, LedgerDefaults::default()).await;

        let local = find_quota(ledger.quotas(), LeaveType::Local).unwrap();
        assert_eq!(local.total, 12.0);
        assert_eq!(local.used, 2.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_used_is_recomputed_on_open() -> Result<()> {
        let storage = MemoryStore::with_entries([
            (RECORDS_KEY, "[]"),
            (QUOTAS_KEY, r#"[{"type": "local", "total": 12, "used": 7}]"#),
        ]);
        let ledger = LeaveLedger::open(storage, LedgerDefaults::default()).await;

        assert_eq!(ledger.quotas().len(), 1);
        assert_eq!(ledger.quotas()[0].used, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_current_data_version_left_untouched() -> Result<()> {
        let storage = MemoryStore::with_entries([(DATA_VERSION_KEY, CURRENT_DATA_VERSION)]);

        let ledger = LeaveLedger::open(storage, LedgerDefaults::default()).await;
        let storage = ledger.into_storage();
        assert_eq!(
            storage.get(DATA_VERSION_KEY).await?.as_deref(),
            Some(CURRENT_DATA_VERSION)
        );

        let storage = MemoryStore::with_entries([(DATA_VERSION_KEY, "0")]);
        let storage = LeaveLedger::open(storage, LedgerDefaults::default())
            .await
            .into_storage();
        assert_eq!(
            storage.get(DATA_VERSION_KEY).await?.as_deref(),
            Some(CURRENT_DATA_VERSION)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_add_add_remove_scenario() -> Result<()> {
        let defaults = LedgerDefaults {
            quotas: vec![LeaveQuota::new(LeaveType::Local, 12.0)],
            records: Vec::new(),
        };
        let mut ledger = LeaveLedger::open(MemoryStore::new(), defaults).await;

        let snapshot = ledger
            .add(record("1", LeaveType::Local, date(2025, 4, 10), date(2025, 4, 10)))
            .await?;
        assert_eq!(used(&snapshot, LeaveType::Local), 1.0);

        let snapshot = ledger
            .add(record("2", LeaveType::Local, date(2025, 4, 12), date(2025, 4, 14)))
            .await?;
        assert_eq!(used(&snapshot, LeaveType::Local), 4.0);

        let on_13th = ledger.leaves_on(date(2025, 4, 13));
        assert_eq!(on_13th.len(), 1);
        assert_eq!(on_13th[0].id.as_str(), "2");

        let snapshot = ledger.remove(&"1".into()).await;
        assert_eq!(used(&snapshot, LeaveType::Local), 3.0);
        assert!(snapshot.is_persisted());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_persists_before_returning() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Vacation, date(2025, 7, 1), date(2025, 7, 5)))
            .await?;

        let storage = ledger.into_storage();
        let stored: Vec<LeaveRecord> =
            serde_json::from_str(&storage.get(RECORDS_KEY).await?.unwrap())?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id.as_str(), "a");
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_add_changes_nothing() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Local, date(2025, 4, 10), date(2025, 4, 10)))
            .await?;

        let result = ledger
            .add(record("a", LeaveType::Sick, date(2025, 4, 1), date(2025, 4, 30)))
            .await;
        assert!(matches!(result, Err(Error::DuplicateId { .. })));
        assert_eq!(find_quota(ledger.quotas(), LeaveType::Sick).unwrap().used, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_validates_and_assigns_identity() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        let now = Utc::now();

        let bad = LeaveDraft {
            end_date: date(2025, 4, 1),
            ..LeaveDraft::single_day(LeaveType::Local, date(2025, 4, 10))
        };
        assert!(matches!(
            ledger.submit(bad, now).await,
            Err(Error::Validation { .. })
        ));
        assert!(ledger.records().is_empty());

        let snapshot = ledger
            .submit(LeaveDraft::single_day(LeaveType::HalfSick, date(2025, 4, 10)), now)
            .await?;
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].created_at, now);
        assert!(!snapshot.records[0].id.as_str().is_empty());
        assert_eq!(used(&snapshot, LeaveType::HalfSick), 0.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_id_writes_nothing() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Local, date(2025, 4, 10), date(2025, 4, 10)))
            .await?;
        let before = ledger.records();

        let snapshot = ledger
            .update(record("ghost", LeaveType::Sick, date(2025, 1, 1), date(2025, 1, 9)))
            .await;

        assert_eq!(snapshot.records, before);
        assert_eq!(used(&snapshot, LeaveType::Sick), 0.0);
        assert!(snapshot.is_persisted());
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_reconciles_and_keeps_identity() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        let original = record("a", LeaveType::Local, date(2025, 4, 10), date(2025, 4, 10));
        ledger.add(original.clone()).await?;

        let draft = LeaveDraft {
            end_date: date(2025, 4, 12),
            ..LeaveDraft::single_day(LeaveType::Vacation, date(2025, 4, 10))
        };
        let snapshot = ledger.edit(&"a".into(), draft).await?;

        assert_eq!(snapshot.records[0].id, original.id);
        assert_eq!(snapshot.records[0].created_at, original.created_at);
        assert_eq!(used(&snapshot, LeaveType::Local), 0.0);
        assert_eq!(used(&snapshot, LeaveType::Vacation), 3.0);

        let invalid = LeaveDraft {
            end_date: date(2025, 4, 1),
            ..LeaveDraft::single_day(LeaveType::Vacation, date(2025, 4, 10))
        };
        assert!(ledger.edit(&"a".into(), invalid).await.is_err());
        assert_eq!(ledger.records()[0].end_date, date(2025, 4, 12));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_and_warns() -> Result<()> {
        let mut ledger =
            LeaveLedger::open(MemoryStore::with_capacity_limit(4096), LedgerDefaults::default())
                .await;
        assert!(!ledger.is_degraded());

        let mut big = record("big", LeaveType::Vacation, date(2025, 8, 1), date(2025, 8, 3));
        big.reason = "x".repeat(8192);
        let snapshot = ledger.add(big).await?;

        assert!(!snapshot.is_persisted());
        assert!(snapshot.warning.unwrap().contains("leave-records"));
        assert!(ledger.is_degraded());
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(find_quota(ledger.quotas(), LeaveType::Vacation).unwrap().used, 3.0);

        // Once the record goes away storage can catch up again
        ledger.remove(&"big".into()).await;
        ledger.flush().await?;
        assert!(!ledger.is_degraded());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_quota_total_does_not_touch_used() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Sick, date(2025, 4, 1), date(2025, 4, 4)))
            .await?;

        let snapshot = ledger.set_quota_total(LeaveType::Sick, 2.0).await?;
        let sick = find_quota(&snapshot.quotas, LeaveType::Sick).unwrap();
        assert_eq!(sick.total, 2.0);
        assert_eq!(sick.used, 4.0);
        assert!(sick.is_exceeded());

        assert!(matches!(
            ledger.set_quota_total(LeaveType::Sick, f64::NAN).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_quota_for_unconfigured_type() {
        let defaults = LedgerDefaults {
            quotas: vec![LeaveQuota::new(LeaveType::Local, 12.0)],
            records: Vec::new(),
        };
        let mut ledger = LeaveLedger::open(MemoryStore::new(), defaults).await;

        let result = ledger.set_quota_total(LeaveType::Vacation, 5.0).await;
        assert!(matches!(
            result,
            Err(Error::QuotaNotFound {
                leave_type: LeaveType::Vacation
            })
        ));
    }

    #[tokio::test]
    async fn test_reset_quotas() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Local, date(2025, 4, 1), date(2025, 4, 2)))
            .await?;
        ledger.set_quota_total(LeaveType::Local, 1.0).await?;

        let snapshot = ledger.reset_quotas().await;
        let local = find_quota(&snapshot.quotas, LeaveType::Local).unwrap();
        assert_eq!(local.total, 12.0);
        assert_eq!(local.used, 2.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_without_records_leaves_list_unchanged() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Local, date(2025, 4, 1), date(2025, 4, 2)))
            .await?;
        let before = ledger.records();

        let result = ledger.import(r#"{"version": "1", "timestamp": "2025-05-01T00:00:00Z"}"#).await;

        assert!(matches!(result, Err(Error::ImportFormat { .. })));
        assert_eq!(ledger.records(), before);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_rejects_duplicate_ids() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        let records = vec![
            record("x", LeaveType::Local, date(2025, 4, 1), date(2025, 4, 1)),
            record("x", LeaveType::Sick, date(2025, 4, 2), date(2025, 4, 2)),
        ];
        let raw = json!({"version": "1", "records": records}).to_string();

        assert!(matches!(
            ledger.import(&raw).await,
            Err(Error::ImportFormat { .. })
        ));
        assert!(ledger.records().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_export_import_replaces_records() -> Result<()> {
        let mut source = open_memory_ledger().await;
        source
            .add(record("s1", LeaveType::Vacation, date(2025, 4, 24), date(2025, 4, 30)))
            .await?;
        let exported = source
            .export(Some(json!({"theme": "dark"})), Utc::now())
            .to_json()?;

        let mut target = open_memory_ledger().await;
        target
            .add(record("t1", LeaveType::Local, date(2025, 1, 1), date(2025, 1, 1)))
            .await?;
        target.set_metadata(&"t1".into(), "mood", json!("good")).await?;

        let snapshot = target.import(&exported).await?;
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].id.as_str(), "s1");
        assert_eq!(used(&snapshot, LeaveType::Vacation), 7.0);
        assert_eq!(used(&snapshot, LeaveType::Local), 0.0);
        assert!(target.metadata(&"t1".into()).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_metadata_side_map() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Local, date(2025, 4, 1), date(2025, 4, 1)))
            .await?;

        ledger
            .set_metadata(&"a".into(), "tags", json!(["family"]))
            .await?;
        assert_eq!(ledger.metadata(&"a".into()).unwrap()["tags"], json!(["family"]));

        assert!(matches!(
            ledger.set_metadata(&"nope".into(), "mood", json!("bad")).await,
            Err(Error::LeaveNotFound { .. })
        ));

        ledger.remove(&"a".into()).await;
        assert!(ledger.metadata(&"a".into()).is_none());

        // The last entry went away with its record, so the key is cleared
        let storage = ledger.into_storage();
        assert!(storage.get(METADATA_KEY).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_metadata_persists_while_entries_remain() -> Result<()> {
        let mut ledger = open_memory_ledger().await;
        ledger
            .add(record("a", LeaveType::Local, date(2025, 4, 1), date(2025, 4, 1)))
            .await?;
        ledger.set_metadata(&"a".into(), "mood", json!("happy")).await?;

        let storage = ledger.into_storage();
        let stored: MetadataMap = serde_json::from_str(&storage.get(METADATA_KEY).await?.unwrap())?;
        assert_eq!(stored.get(&"a".into()).unwrap()["mood"], json!("happy"));
        Ok(())
    }

    fn stored_ids(raw: &str) -> Vec<String> {
        let records: Vec<LeaveRecord> = serde_json::from_str(raw).unwrap();
        records.into_iter().map(|r| r.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_unreadable_records_are_never_overwritten() -> Result<()> {
        let stored = serde_json::to_string(&[
            record("old1", LeaveType::Local, date(2025, 3, 3), date(2025, 3, 3)),
            record("old2", LeaveType::Sick, date(2025, 3, 10), date(2025, 3, 11)),
        ])?;
        let storage = FlakyStore::new(
            MemoryStore::with_entries([
                (RECORDS_KEY, stored.as_str()),
                (DATA_VERSION_KEY, CURRENT_DATA_VERSION),
            ]),
            &[RECORDS_KEY],
        );
        let unreadable = storage.unreadable_keys();

        let mut ledger = LeaveLedger::open(storage, LedgerDefaults::default()).await;
        assert!(ledger.is_degraded());
        assert!(ledger.records().is_empty());

        let snapshot = ledger
            .add(record("new", LeaveType::Vacation, date(2025, 5, 1), date(2025, 5, 2)))
            .await?;
        assert!(snapshot.warning.unwrap().contains(RECORDS_KEY));
        assert_eq!(ledger.records().len(), 1);

        // Still unreadable, then readable but holding data memory never saw
        assert!(ledger.flush().await.is_err());
        unreadable.lock().unwrap().clear();
        assert!(matches!(ledger.flush().await, Err(Error::Persistence { .. })));
        assert!(ledger.is_degraded());

        let storage = ledger.into_storage();
        let raw = storage.get(RECORDS_KEY).await?.unwrap();
        assert_eq!(stored_ids(&raw), ["old1", "old2"]);

        let reopened = LeaveLedger::open(storage, LedgerDefaults::default()).await;
        assert!(!reopened.is_degraded());
        assert_eq!(reopened.records().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_empty_key_released_by_flush() -> Result<()> {
        let storage = FlakyStore::new(MemoryStore::new(), &[METADATA_KEY]);
        let unreadable = storage.unreadable_keys();

        let mut ledger = LeaveLedger::open(storage, LedgerDefaults::default()).await;
        ledger
            .add(record("a", LeaveType::Local, date(2025, 4, 1), date(2025, 4, 1)))
            .await?;
        let snapshot = ledger.set_metadata(&"a".into(), "notes", json!("x")).await?;
        assert!(snapshot.warning.unwrap().contains(METADATA_KEY));

        unreadable.lock().unwrap().clear();
        ledger.flush().await?;
        assert!(!ledger.is_degraded());

        let storage = ledger.into_storage();
        assert!(storage.get(METADATA_KEY).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_data_version_degrades_until_flush() -> Result<()> {
        let storage = FlakyStore::new(MemoryStore::new(), &[DATA_VERSION_KEY]);
        let unreadable = storage.unreadable_keys();

        let mut ledger = LeaveLedger::open(storage, LedgerDefaults::default()).await;
        assert!(ledger.is_degraded());

        // The write itself succeeds, but the snapshot still reports the degraded state
        let snapshot = ledger
            .add(record("a", LeaveType::Sick, date(2025, 4, 2), date(2025, 4, 2)))
            .await?;
        assert!(!snapshot.is_persisted());

        ledger.flush().await?;
        assert!(!ledger.is_degraded());
        let snapshot = ledger.remove(&"a".into()).await;
        assert!(snapshot.is_persisted());

        unreadable.lock().unwrap().clear();
        let storage = ledger.into_storage();
        assert_eq!(
            storage.get(DATA_VERSION_KEY).await?.as_deref(),
            Some(CURRENT_DATA_VERSION)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_ledger_on_sqlite() -> Result<()> {
        let db = setup_test_db().await?;

        let mut ledger =
            LeaveLedger::open(SystemStateStore::new(db.clone()), LedgerDefaults::default()).await;
        ledger
            .add(record("db1", LeaveType::HalfLocal, date(2025, 4, 15), date(2025, 4, 17)))
            .await?;
        assert!(!ledger.is_degraded());

        let reopened = LeaveLedger::open(SystemStateStore::new(db), LedgerDefaults::default()).await;
        assert_eq!(reopened.records().len(), 1);
        assert_eq!(
            find_quota(reopened.quotas(), LeaveType::HalfLocal).unwrap().used,
            1.5
        );
        Ok(())
    }
}
