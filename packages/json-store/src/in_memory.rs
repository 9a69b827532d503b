//! In-memory store.

use std::collections::BTreeMap;

use prefstore_kv_store::{KeyValueStore, Primitive, StoreError};

/// A `BTreeMap`-backed store.
///
/// Deterministic iteration order, no durability. The usual backend for
/// tests and for programs that persist elsewhere.
///
/// # Example
///
/// ```rust
/// use prefstore_json_store::InMemoryStore;
/// use prefstore_kv_store::{KeyValueStore, Primitive};
///
/// let mut store = InMemoryStore::new();
/// store.put("volume", Primitive::Int(80)).unwrap();
/// assert_eq!(store.get("volume").unwrap(), Some(Primitive::Int(80)));
/// ```
pub struct InMemoryStore {
    entries: BTreeMap<String, Primitive>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        InMemoryStore {
            entries: BTreeMap::new(),
        }
    }

    /// Create a store seeded with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Primitive)>) -> Self {
        InMemoryStore {
            entries: entries.into_iter().collect(),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Primitive>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Primitive) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, Primitive)>, StoreError> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
