//! Serde integration for prefstore.
//!
//! [`JsonTransform`] stores any `Serialize + DeserializeOwned` type as a
//! JSON string primitive, so a single binding can back a whole struct.
//!
//! # Example
//!
//! ```rust
//! use prefstore_core::{Transform, TransformRegistry};
//! use prefstore_serde::JsonTransform;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize, PartialEq)]
//! struct WindowState {
//!     width: u32,
//!     height: u32,
//! }
//!
//! let transform = JsonTransform::<WindowState>::new();
//! let state = WindowState { width: 800, height: 600 };
//!
//! let stored = transform.encode(&state).unwrap();
//! assert_eq!(transform.decode(&stored).unwrap(), state);
//!
//! // Or register it for use from field declarations.
//! let registry = TransformRegistry::new();
//! prefstore_serde::register_json::<WindowState>(&registry, "json.window-state").unwrap();
//! ```

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use prefstore_core::{Error, Transform, TransformId, TransformRegistry, TransformResult};
use prefstore_kv_store::{Primitive, PrimitiveKind};

/// Stores a `T` as a JSON string primitive.
///
/// Round-trips for any type whose serde representation is lossless, which
/// covers the usual plain-data structs and enums. Types with lossy or
/// non-deterministic serialization should get a hand-written [`Transform`]
/// instead.
pub struct JsonTransform<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonTransform<T> {
    /// Create the transform.
    pub fn new() -> Self {
        JsonTransform {
            _value: PhantomData,
        }
    }
}

impl<T> Default for JsonTransform<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Transform for JsonTransform<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Value = T;

    fn storage_kind(&self) -> PrimitiveKind {
        PrimitiveKind::String
    }

    fn encode(&self, value: &T) -> TransformResult<Primitive> {
        Ok(Primitive::String(serde_json::to_string(value)?))
    }

    fn decode(&self, stored: &Primitive) -> TransformResult<T> {
        let json = stored
            .as_str()
            .ok_or_else(|| format!("JSON transform expects string storage, found {}", stored.kind()))?;
        Ok(serde_json::from_str(json)?)
    }
}

/// Register a [`JsonTransform<T>`] under `id` in `registry`.
pub fn register_json<T>(
    registry: &TransformRegistry,
    id: impl Into<TransformId>,
) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    registry.register(id, JsonTransform::<T>::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
    struct Profile {
        name: String,
        scores: Vec<i32>,
        labels: BTreeMap<String, String>,
    }

    fn profile() -> Profile {
        Profile {
            name: "alice".to_string(),
            scores: vec![3, 7],
            labels: [("team".to_string(), "red".to_string())].into_iter().collect(),
        }
    }

    #[test]
    fn roundtrips_structurally() {
        let transform = JsonTransform::<Profile>::new();
        let original = profile();

        let stored = transform.encode(&original).unwrap();
        assert_eq!(stored.kind(), PrimitiveKind::String);

        let decoded = transform.decode(&stored).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_rejects_non_string_storage() {
        let transform = JsonTransform::<Profile>::new();
        let err = transform.decode(&Primitive::Int(1)).unwrap_err();
        assert!(err.to_string().contains("string storage"));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let transform = JsonTransform::<Profile>::new();
        let err = transform
            .decode(&Primitive::String("{not json".to_string()))
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn register_json_is_idempotent() {
        let registry = TransformRegistry::new();
        register_json::<Profile>(&registry, "json.profile").unwrap();
        register_json::<Profile>(&registry, "json.profile").unwrap();
        assert!(registry.contains(&TransformId::from("json.profile")));
    }

    #[test]
    fn register_json_conflicts_across_types() {
        let registry = TransformRegistry::new();
        register_json::<Profile>(&registry, "json.value").unwrap();
        let err = register_json::<Vec<String>>(&registry, "json.value").unwrap_err();
        assert!(matches!(err, Error::TransformConflict(_)));
    }
}
