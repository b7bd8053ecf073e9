use crate::{
    errors::{Error, Result},
    storage::KeyValueStore,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value store held in memory, optionally with a byte budget.
///
/// With a capacity set, a write that would push the total size of keys and values
/// over the budget fails the way a full browser store does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// An empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store that rejects writes beyond `bytes` in total.
    #[must_use]
    pub fn with_capacity_limit(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Some(bytes),
        }
    }

    /// A store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            capacity: None,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| Error::Persistence {
            message: "Failed to acquire memory store lock".to_string(),
        })
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;

        if let Some(capacity) = self.capacity {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > capacity {
                return Err(Error::Persistence {
                    message: format!(
                        "storage quota exceeded writing '{key}' ({needed} of {capacity} bytes)"
                    ),
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() -> Result<()> {
        let store = MemoryStore::new();

        assert_eq!(store.get("k").await?, None);
        store.set("k", "v1").await?;
        store.set("k", "v2").await?;
        assert_eq!(store.get("k").await?.as_deref(), Some("v2"));

        store.remove("k").await?;
        store.remove("k").await?;
        assert_eq!(store.get("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_capacity_limit() -> Result<()> {
        let store = MemoryStore::with_capacity_limit(10);

        store.set("ab", "12345678").await?;
        // Overwriting the same key only counts the new value
        store.set("ab", "87654321").await?;

        let err = store.set("c", "x").await.unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
        assert_eq!(store.get("c").await?, None);
        assert_eq!(store.get("ab").await?.as_deref(), Some("87654321"));
        Ok(())
    }
}
