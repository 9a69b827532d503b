//! Concrete prefstore backends.
//!
//! Two [`KeyValueStore`](prefstore_kv_store::KeyValueStore) implementations:
//! [`InMemoryStore`] for tests and programs that persist elsewhere, and
//! [`JsonFileStore`], which keeps the whole keyspace in one JSON file with a
//! kind tag per entry so every primitive kind survives a save/load cycle
//! exactly.

mod convert;
mod error;
mod in_memory;
mod json_file;

pub use error::FileStoreError;
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
