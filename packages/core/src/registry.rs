//! The transform registry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use prefstore_kv_store::{Primitive, PrimitiveKind};

use crate::transform::{Transform, TransformId, TransformResult};
use crate::Error;

/// A registered transform with its value type erased.
///
/// The accessor checks a caller's type against `value_type` before invoking
/// either closure, so the downcast inside `encode` never fails in practice;
/// it still reports rather than panics if it does.
pub(crate) struct ErasedTransform {
    pub(crate) value_type: TypeId,
    pub(crate) value_type_name: &'static str,
    pub(crate) storage_kind: PrimitiveKind,
    encode: Box<dyn Fn(&(dyn Any + Send + Sync)) -> TransformResult<Primitive> + Send + Sync>,
    decode: Box<dyn Fn(&Primitive) -> TransformResult<Box<dyn Any + Send + Sync>> + Send + Sync>,
}

impl ErasedTransform {
    pub(crate) fn encode_value(
        &self,
        value: &(dyn Any + Send + Sync),
    ) -> TransformResult<Primitive> {
        (self.encode)(value)
    }

    pub(crate) fn decode_value(
        &self,
        stored: &Primitive,
    ) -> TransformResult<Box<dyn Any + Send + Sync>> {
        (self.decode)(stored)
    }
}

/// Maps transform ids to registered transforms.
///
/// Read-mostly after startup: registration takes the write lock for the
/// duration of the insert, lookups share a read lock. Registered transforms
/// live for the registry's lifetime.
///
/// # Example
///
/// ```rust
/// use prefstore_core::{Transform, TransformRegistry, TransformResult};
/// use prefstore_kv_store::{Primitive, PrimitiveKind};
///
/// struct HexTransform;
///
/// impl Transform for HexTransform {
///     type Value = u32;
///
///     fn storage_kind(&self) -> PrimitiveKind {
///         PrimitiveKind::String
///     }
///
///     fn encode(&self, value: &u32) -> TransformResult<Primitive> {
///         Ok(Primitive::String(format!("{value:08x}")))
///     }
///
///     fn decode(&self, stored: &Primitive) -> TransformResult<u32> {
///         let s = stored.as_str().ok_or("expected string storage")?;
///         Ok(u32::from_str_radix(s, 16)?)
///     }
/// }
///
/// let registry = TransformRegistry::new();
/// registry.register("hex", HexTransform).unwrap();
/// // Same id, same value type and storage kind: a no-op.
/// registry.register("hex", HexTransform).unwrap();
/// ```
pub struct TransformRegistry {
    entries: RwLock<HashMap<TransformId, Arc<ErasedTransform>>>,
}

lazy_static! {
    static ref GLOBAL: Arc<TransformRegistry> = Arc::new(TransformRegistry::new());
}

impl TransformRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    ///
    /// Convenient when one set of transforms serves the whole program;
    /// anything needing isolation should carry its own registry.
    pub fn global() -> Arc<TransformRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Register `transform` under `id`.
    ///
    /// Re-registering an id with the same value type and storage kind is a
    /// no-op keeping the first registration. An id already registered with a
    /// different value type or storage kind fails with
    /// [`Error::TransformConflict`].
    pub fn register<T: Transform>(
        &self,
        id: impl Into<TransformId>,
        transform: T,
    ) -> Result<(), Error> {
        let id = id.into();
        let storage_kind = transform.storage_kind();
        let value_type = TypeId::of::<T::Value>();
        let value_type_name = std::any::type_name::<T::Value>();

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = entries.get(&id) {
            if existing.value_type == value_type && existing.storage_kind == storage_kind {
                return Ok(());
            }
            return Err(Error::TransformConflict(id));
        }

        let transform = Arc::new(transform);
        let encoder = Arc::clone(&transform);
        let entry = ErasedTransform {
            value_type,
            value_type_name,
            storage_kind,
            encode: Box::new(move |value| {
                let value = value
                    .downcast_ref::<T::Value>()
                    .ok_or("transform invoked with a foreign value type")?;
                encoder.encode(value)
            }),
            decode: Box::new(move |stored| {
                let decoded = transform.decode(stored)?;
                Ok(Box::new(decoded) as Box<dyn Any + Send + Sync>)
            }),
        };

        tracing::debug!(
            id = %id,
            value_type = value_type_name,
            kind = %storage_kind,
            "registered transform"
        );
        entries.insert(id, Arc::new(entry));
        Ok(())
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &TransformId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub(crate) fn lookup(&self, id: &TransformId) -> Result<Arc<ErasedTransform>, Error> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownTransform(id.clone()))
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
