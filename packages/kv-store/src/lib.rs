//! Prefstore key-value layer: the storage collaborator contract.
//!
//! This is the narrow waist of the prefstore stack. Everything at this level
//! is a flat keyspace of [`Primitive`] values - no field names, no defaults,
//! no transforms, no change notification. Those belong to the binding layer
//! above.
//!
//! # Example
//!
//! ```rust
//! use prefstore_kv_store::{KeyValueStore, Primitive, StoreError};
//!
//! struct CountingStore {
//!     entries: std::collections::BTreeMap<String, Primitive>,
//! }
//!
//! impl KeyValueStore for CountingStore {
//!     fn get(&self, key: &str) -> Result<Option<Primitive>, StoreError> {
//!         Ok(self.entries.get(key).cloned())
//!     }
//!
//!     fn put(&mut self, key: &str, value: Primitive) -> Result<(), StoreError> {
//!         self.entries.insert(key.to_string(), value);
//!         Ok(())
//!     }
//!
//!     fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
//!         Ok(self.entries.remove(key).is_some())
//!     }
//!
//!     fn clear(&mut self) -> Result<(), StoreError> {
//!         self.entries.clear();
//!         Ok(())
//!     }
//!
//!     fn entries(&self) -> Result<Vec<(String, Primitive)>, StoreError> {
//!         Ok(self.entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
//!     }
//! }
//! ```

mod error;
mod primitive;
mod traits;

pub use error::StoreError;
pub use primitive::{Primitive, PrimitiveKind};
pub use traits::KeyValueStore;
