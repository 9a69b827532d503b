//! File-backed store: one JSON file, kind-tagged entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde_json::Value as JsonValue;

use prefstore_kv_store::{KeyValueStore, Primitive, StoreError};

use crate::convert::{json_to_primitive, primitive_to_json};
use crate::FileStoreError;

/// A store persisted as a single JSON file.
///
/// The file holds one top-level object with a kind-tagged entry per key:
///
/// ```json
/// {
///   "volume": { "int": 80 },
///   "last_seen": { "long": 1722800000 },
///   "nickname": { "string": "alice" }
/// }
/// ```
///
/// The whole file is loaded at [`open`](Self::open) and rewritten after
/// every mutation; a mutation whose rewrite fails is rolled back in memory,
/// so the store never reports state it could not persist. Suited to
/// preference-sized data, not bulk data.
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Primitive>,
}

impl JsonFileStore {
    /// Open the store backed by the file at `path`.
    ///
    /// A missing file is an empty store; the file is created on the first
    /// mutation. An existing file must hold the entry layout documented
    /// above.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&path, &text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(FileStoreError::Io {
                    action: "read",
                    path,
                    source,
                })
            }
        };
        Ok(JsonFileStore { path, entries })
    }

    /// The backing file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(path: &Path, text: &str) -> Result<BTreeMap<String, Primitive>, FileStoreError> {
        let json: JsonValue = serde_json::from_str(text).map_err(|source| FileStoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let map = json.as_object().ok_or_else(|| FileStoreError::NotAnObject {
            path: path.to_path_buf(),
        })?;

        let mut entries = BTreeMap::new();
        for (key, value) in map {
            let primitive =
                json_to_primitive(value).ok_or_else(|| FileStoreError::MalformedEntry {
                    path: path.to_path_buf(),
                    key: key.clone(),
                })?;
            entries.insert(key.clone(), primitive);
        }
        Ok(entries)
    }

    fn persist(&self) -> Result<(), FileStoreError> {
        let map: serde_json::Map<String, JsonValue> = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), primitive_to_json(value)))
            .collect();

        let text =
            serde_json::to_string_pretty(&JsonValue::Object(map)).map_err(|source| {
                FileStoreError::Io {
                    action: "serialize",
                    path: self.path.clone(),
                    source: io::Error::other(source),
                }
            })?;

        fs::write(&self.path, text).map_err(|source| FileStoreError::Io {
            action: "write",
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Primitive>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Primitive) -> Result<(), StoreError> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.persist() {
            match previous {
                Some(p) => self.entries.insert(key.to_string(), p),
                None => self.entries.remove(key),
            };
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.entries.insert(key.to_string(), previous);
            return Err(e.into());
        }
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.entries);
        if let Err(e) = self.persist() {
            self.entries = previous;
            return Err(e.into());
        }
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
