//! Durable key-value storage for ledger state.
//!
//! The ledger only needs string values under a handful of keys, so the persistence
//! seam is a small trait. `MemoryStore` backs tests and in-memory sessions;
//! `SystemStateStore` persists to the `system_state` table through `SeaORM`.

use crate::errors::Result;

/// In-process store
pub mod memory;
/// `SeaORM`-backed store
pub mod system_state;

pub use memory::MemoryStore;
pub use system_state::SystemStateStore;

/// Key holding the JSON array of leave records.
pub const RECORDS_KEY: &str = "leave-records";
/// Key holding the JSON array of leave quotas.
pub const QUOTAS_KEY: &str = "leave-quotas";
/// Key holding the data layout version.
pub const DATA_VERSION_KEY: &str = "data-version";
/// Key holding the per-record metadata document.
pub const METADATA_KEY: &str = "leave-metadata";

/// Layout version written by this build.
pub const CURRENT_DATA_VERSION: &str = "1";

/// A single-namespace string key-value store.
pub trait KeyValueStore {
    /// Value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`; absent keys are ignored.
    async fn remove(&self, key: &str) -> Result<()>;
}
