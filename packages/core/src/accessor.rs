//! Typed field access over a key-value collaborator.
//!
//! [`StoreHandle`] wraps the external store; [`BindContext`] ties a store to
//! a transform registry, a resolver cache, and a change bus; [`Prefs`] is the
//! per-host-type surface every field read and write goes through.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use prefstore_kv_store::{KeyValueStore, Primitive, StoreError};

use crate::bus::{
    ChangeBus, ChangeNotice, HandlerFailure, HandlerResult, PublishReport, SubscriptionHandle,
};
use crate::descriptor::{BindingSet, FieldBinding};
use crate::error::{Error, TransformOp};
use crate::registry::TransformRegistry;
use crate::resolver::Resolver;
use crate::schema::HostSchema;

/// The engine's handle on the external key-value collaborator.
///
/// The store itself sits behind a mutex; a separate per-key lock table
/// serializes the read-compare-write-publish sequence of [`Prefs::set`]
/// against other writers of the same key. Lock order is always key lock
/// first, store mutex second.
///
/// The raw collaborator surface (`get`, `put`, `contains`, `remove`,
/// `clear`, `entries`) is exposed for maintenance and migration work; it
/// bypasses bindings, transforms, and change publication entirely.
pub struct StoreHandle {
    store: Mutex<Box<dyn KeyValueStore>>,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl StoreHandle {
    /// Wrap `store`.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        StoreHandle {
            store: Mutex::new(Box::new(store)),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the primitive stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Primitive>, StoreError> {
        self.store.lock().unwrap_or_else(|e| e.into_inner()).get(key)
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn put(&self, key: &str, value: Primitive) -> Result<(), StoreError> {
        self.store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(key, value)
    }

    /// Whether a value is stored under `key`.
    pub fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }

    /// Remove the value stored under `key`; `true` if one existed.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
    }

    /// Remove every stored value.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.lock().unwrap_or_else(|e| e.into_inner()).clear()
    }

    /// Every stored `(key, value)` pair.
    pub fn entries(&self) -> Result<Vec<(String, Primitive)>, StoreError> {
        self.store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries()
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.key_locks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .entry(key.to_string())
                .or_default(),
        )
    }
}

/// The outcome of one [`Prefs::set`].
#[derive(Debug)]
pub struct WriteOutcome {
    /// Whether the write changed the field's effective value (its stored
    /// primitive, or its declared default while the key was unset).
    pub changed: bool,
    /// The publish report, present when the write changed a tagged field.
    pub publish: Option<PublishReport>,
}

impl WriteOutcome {
    /// How many handlers the write notified.
    pub fn notified(&self) -> usize {
        self.publish.as_ref().map_or(0, |r| r.notified)
    }

    /// Handler failures captured during the publish.
    pub fn failures(&self) -> &[HandlerFailure] {
        self.publish.as_ref().map_or(&[], |r| r.failures.as_slice())
    }
}

/// Binds host schemas against one store, registry, and bus.
///
/// Resolution is cached per host type name; binding further instances of a
/// resolved type is a cache hit.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use prefstore_core::{BindContext, FieldDecl, HostSchema};
/// use prefstore_kv_store::{KeyValueStore, Primitive, StoreError};
///
/// #[derive(Default)]
/// struct MapStore(BTreeMap<String, Primitive>);
///
/// impl KeyValueStore for MapStore {
///     fn get(&self, key: &str) -> Result<Option<Primitive>, StoreError> {
///         Ok(self.0.get(key).cloned())
///     }
///     fn put(&mut self, key: &str, value: Primitive) -> Result<(), StoreError> {
///         self.0.insert(key.to_string(), value);
///         Ok(())
///     }
///     fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
///         Ok(self.0.remove(key).is_some())
///     }
///     fn clear(&mut self) -> Result<(), StoreError> {
///         self.0.clear();
///         Ok(())
///     }
///     fn entries(&self) -> Result<Vec<(String, Primitive)>, StoreError> {
///         Ok(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
///     }
/// }
///
/// let context = BindContext::new(MapStore::default());
/// let prefs = context
///     .bind(&HostSchema::new("Settings").field(FieldDecl::int("volume").default_value(80)))
///     .unwrap();
///
/// assert_eq!(prefs.get::<i32>("volume").unwrap(), 80);
/// prefs.set("volume", 40).unwrap();
/// assert_eq!(prefs.get::<i32>("volume").unwrap(), 40);
/// ```
pub struct BindContext {
    resolver: Resolver,
    bus: Arc<ChangeBus>,
    store: Arc<StoreHandle>,
}

impl BindContext {
    /// A context over `store` with its own transform registry.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_registry(store, Arc::new(TransformRegistry::new()))
    }

    /// A context over `store` validating and running transforms from
    /// `registry`.
    ///
    /// Pass [`TransformRegistry::global`] to share the process-wide
    /// transforms across contexts.
    pub fn with_registry(
        store: impl KeyValueStore + 'static,
        registry: Arc<TransformRegistry>,
    ) -> Self {
        BindContext {
            resolver: Resolver::new(registry),
            bus: Arc::new(ChangeBus::new()),
            store: Arc::new(StoreHandle::new(store)),
        }
    }

    /// The registry transforms are looked up in.
    pub fn registry(&self) -> &Arc<TransformRegistry> {
        self.resolver.registry()
    }

    /// The change bus writes publish to.
    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    /// The wrapped store.
    pub fn store(&self) -> &Arc<StoreHandle> {
        &self.store
    }

    /// Resolve `schema` (or reuse its cached resolution) and produce the
    /// typed accessor for the host type.
    pub fn bind(&self, schema: &HostSchema) -> Result<Prefs, Error> {
        let bindings = self.resolver.resolve(schema)?;
        Ok(Prefs {
            bindings,
            registry: Arc::clone(self.resolver.registry()),
            bus: Arc::clone(&self.bus),
            store: Arc::clone(&self.store),
        })
    }
}

/// Typed field access for one bound host type.
///
/// Cloning is cheap; clones share the same store, bus, and bindings, so a
/// `Prefs` can be handed to any thread that reads or writes the host type's
/// fields.
#[derive(Clone)]
pub struct Prefs {
    bindings: Arc<BindingSet>,
    registry: Arc<TransformRegistry>,
    bus: Arc<ChangeBus>,
    store: Arc<StoreHandle>,
}

impl Prefs {
    /// The resolved bindings this accessor serves.
    pub fn bindings(&self) -> &Arc<BindingSet> {
        &self.bindings
    }

    /// Read `field` as a `T`.
    ///
    /// An unset key with a declared default yields the decoded default; the
    /// default is not written back. An unset key with no default fails with
    /// [`Error::UnsetField`]. A stored primitive of the wrong kind fails with
    /// [`Error::KindMismatch`] and is never coerced.
    pub fn get<T: Send + Sync + 'static>(&self, field: &str) -> Result<T, Error> {
        match self.try_get(field)? {
            Some(value) => Ok(value),
            None => {
                let binding = self.binding(field)?;
                Err(Error::UnsetField {
                    field: binding.field().to_string(),
                    key: binding.key().to_string(),
                })
            }
        }
    }

    /// Read `field` as a `T`, with `Ok(None)` as the unset sentinel.
    ///
    /// Identical to [`get`](Self::get) except that an unset key with no
    /// default is `Ok(None)` instead of an error.
    pub fn try_get<T: Send + Sync + 'static>(&self, field: &str) -> Result<Option<T>, Error> {
        let binding = self.binding(field)?;
        self.check_value_type::<T>(binding)?;

        let stored = match self.store.get(binding.key())? {
            Some(primitive) => primitive,
            None => match binding.default() {
                Some(default) => default.clone(),
                None => return Ok(None),
            },
        };

        if stored.kind() != binding.kind() {
            return Err(Error::KindMismatch {
                field: binding.field().to_string(),
                key: binding.key().to_string(),
                expected: binding.kind(),
                found: stored.kind(),
            });
        }

        self.decode(binding, &stored).map(Some)
    }

    /// Write `value` to `field`.
    ///
    /// The value is encoded (through the field's transform if one is bound),
    /// kind-checked, and stored. If the encoded primitive differs from the
    /// field's previous effective value (the stored primitive, or the
    /// declared default while the key is unset) and the field carries a tag,
    /// the new value is published to every subscriber of that tag before
    /// `set` returns. The whole read-write-publish sequence holds the
    /// field's key lock, so concurrent writers of one key cannot
    /// double-publish a transition or mis-detect no-change. A handler must
    /// not write the field it is being notified about; it would deadlock on
    /// that key lock.
    pub fn set<T: Send + Sync + 'static>(&self, field: &str, value: T) -> Result<WriteOutcome, Error> {
        let binding = self.binding(field)?;
        self.check_value_type::<T>(binding)?;

        let encoded = self.encode(binding, &value)?;
        if encoded.kind() != binding.kind() {
            return Err(Error::KindMismatch {
                field: binding.field().to_string(),
                key: binding.key().to_string(),
                expected: binding.kind(),
                found: encoded.kind(),
            });
        }

        let key_lock = self.store.key_lock(binding.key());
        let _guard = key_lock.lock().unwrap_or_else(|e| e.into_inner());

        let previous = self.store.get(binding.key())?;
        let reference = previous.as_ref().or(binding.default());
        let changed = reference != Some(&encoded);
        self.store.put(binding.key(), encoded.clone())?;

        let publish = match (changed, binding.tag()) {
            (true, Some(tag)) => {
                let notice = ChangeNotice::new(
                    tag,
                    binding.field(),
                    binding.key(),
                    Arc::new(value),
                    encoded,
                );
                Some(self.bus.publish(&notice))
            }
            _ => None,
        };

        Ok(WriteOutcome { changed, publish })
    }

    /// Whether `field`'s key currently holds a stored value.
    pub fn is_set(&self, field: &str) -> Result<bool, Error> {
        let binding = self.binding(field)?;
        Ok(self.store.contains(binding.key())?)
    }

    /// Remove `field`'s stored value, returning it to its unset state.
    ///
    /// Returns `true` if a value existed. Removal is administrative and does
    /// not publish.
    pub fn unset(&self, field: &str) -> Result<bool, Error> {
        let binding = self.binding(field)?;
        let key_lock = self.store.key_lock(binding.key());
        let _guard = key_lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.store.remove(binding.key())?)
    }

    /// Store the declared default for every defaulted field whose key is
    /// still unset.
    ///
    /// Returns how many keys were written. Materializing defaults does not
    /// publish.
    pub fn write_defaults(&self) -> Result<usize, Error> {
        let mut written = 0;
        for binding in self.bindings.iter() {
            let Some(default) = binding.default() else {
                continue;
            };
            let key_lock = self.store.key_lock(binding.key());
            let _guard = key_lock.lock().unwrap_or_else(|e| e.into_inner());
            if !self.store.contains(binding.key())? {
                self.store.put(binding.key(), default.clone())?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Register `handler` on `tag`.
    ///
    /// Delegates to the context's bus; the handler fires for changed writes
    /// to any field tagged `tag`, from this accessor or any other bound
    /// through the same context.
    pub fn subscribe<F>(&self, tag: impl Into<String>, handler: F) -> SubscriptionHandle
    where
        F: Fn(&ChangeNotice) -> HandlerResult + Send + Sync + 'static,
    {
        self.bus.subscribe(tag, handler)
    }

    /// Remove the subscription behind `handle`.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        self.bus.unsubscribe(handle)
    }

    fn binding(&self, field: &str) -> Result<&FieldBinding, Error> {
        self.bindings.get(field).ok_or_else(|| Error::UnknownField {
            type_name: self.bindings.type_name().to_string(),
            field: field.to_string(),
        })
    }

    fn check_value_type<T: 'static>(&self, binding: &FieldBinding) -> Result<(), Error> {
        if TypeId::of::<T>() != binding.value_type {
            return Err(Error::ValueTypeMismatch {
                field: binding.field().to_string(),
                declared: binding.value_type_name(),
                requested: std::any::type_name::<T>(),
            });
        }
        Ok(())
    }

    fn encode<T: Send + Sync + 'static>(
        &self,
        binding: &FieldBinding,
        value: &T,
    ) -> Result<Primitive, Error> {
        match binding.transform() {
            Some(id) => {
                let transform = self.registry.lookup(id)?;
                transform.encode_value(value).map_err(|source| Error::TransformFailed {
                    field: binding.field().to_string(),
                    transform: id.clone(),
                    op: TransformOp::Encode,
                    source,
                })
            }
            None => {
                let value = value as &dyn Any;
                let primitive = if let Some(v) = value.downcast_ref::<i32>() {
                    Primitive::Int(*v)
                } else if let Some(v) = value.downcast_ref::<i64>() {
                    Primitive::Long(*v)
                } else if let Some(v) = value.downcast_ref::<f32>() {
                    Primitive::Float(*v)
                } else if let Some(v) = value.downcast_ref::<bool>() {
                    Primitive::Bool(*v)
                } else if let Some(v) = value.downcast_ref::<String>() {
                    Primitive::String(v.clone())
                } else {
                    // check_value_type admits only the five native types here
                    return Err(Error::ValueTypeMismatch {
                        field: binding.field().to_string(),
                        declared: binding.value_type_name(),
                        requested: std::any::type_name::<T>(),
                    });
                };
                Ok(primitive)
            }
        }
    }

    fn decode<T: Send + Sync + 'static>(
        &self,
        binding: &FieldBinding,
        stored: &Primitive,
    ) -> Result<T, Error> {
        let boxed: Box<dyn Any + Send + Sync> = match binding.transform() {
            Some(id) => {
                let transform = self.registry.lookup(id)?;
                transform.decode_value(stored).map_err(|source| Error::TransformFailed {
                    field: binding.field().to_string(),
                    transform: id.clone(),
                    op: TransformOp::Decode,
                    source,
                })?
            }
            None => match stored.clone() {
                Primitive::Int(v) => Box::new(v),
                Primitive::Long(v) => Box::new(v),
                Primitive::Float(v) => Box::new(v),
                Primitive::Bool(v) => Box::new(v),
                Primitive::String(v) => Box::new(v),
            },
        };

        boxed.downcast::<T>().map(|b| *b).map_err(|_| Error::ValueTypeMismatch {
            field: binding.field().to_string(),
            declared: binding.value_type_name(),
            requested: std::any::type_name::<T>(),
        })
    }
}
