//! Schema resolution: turning field declarations into binding descriptors.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use prefstore_kv_store::PrimitiveKind;

use crate::descriptor::{BindingSet, FieldBinding};
use crate::registry::TransformRegistry;
use crate::schema::{DefaultSpec, HostSchema};
use crate::Error;

/// The Rust type a plain (untransformed) field of `kind` reads and writes.
fn native_value_type(kind: PrimitiveKind) -> (TypeId, &'static str) {
    match kind {
        PrimitiveKind::Int => (TypeId::of::<i32>(), std::any::type_name::<i32>()),
        PrimitiveKind::Long => (TypeId::of::<i64>(), std::any::type_name::<i64>()),
        PrimitiveKind::Float => (TypeId::of::<f32>(), std::any::type_name::<f32>()),
        PrimitiveKind::Bool => (TypeId::of::<bool>(), std::any::type_name::<bool>()),
        PrimitiveKind::String => (TypeId::of::<String>(), std::any::type_name::<String>()),
    }
}

/// Resolve a host schema into a binding set.
///
/// Pure: consults `registry` to validate transform directives but changes
/// nothing. Descriptors come out in field-declaration order. Every
/// validation failure names the offending field, key, or transform id.
pub fn resolve(schema: &HostSchema, registry: &TransformRegistry) -> Result<BindingSet, Error> {
    let mut bindings = Vec::with_capacity(schema.fields.len());
    let mut index = HashMap::with_capacity(schema.fields.len());
    let mut seen_keys = HashSet::with_capacity(schema.fields.len());

    for decl in schema.fields() {
        if decl.kinds.len() != 1 {
            return Err(Error::ConflictingDirectives {
                type_name: schema.type_name.clone(),
                field: decl.name.clone(),
                count: decl.kinds.len(),
            });
        }
        let kind = decl.kinds[0];

        let key = decl.key.clone().unwrap_or_else(|| decl.name.clone());
        if !seen_keys.insert(key.clone()) {
            return Err(Error::DuplicateKey {
                type_name: schema.type_name.clone(),
                key,
            });
        }

        let (value_type, value_type_name, transform) = match &decl.transform {
            Some(t) => {
                let erased = registry.lookup(&t.id)?;
                if erased.value_type != t.value_type {
                    return Err(Error::TransformTypeMismatch {
                        field: decl.name.clone(),
                        transform: t.id.clone(),
                        transform_type: erased.value_type_name,
                        declared_type: t.value_type_name,
                    });
                }
                if erased.storage_kind != kind {
                    return Err(Error::KindMismatch {
                        field: decl.name.clone(),
                        key,
                        expected: kind,
                        found: erased.storage_kind,
                    });
                }
                (t.value_type, t.value_type_name, Some(t.id.clone()))
            }
            None => {
                let (ty, name) = native_value_type(kind);
                (ty, name, None)
            }
        };

        let default = match &decl.default {
            None => None,
            Some(DefaultSpec::TypeDefault) => Some(kind.zero()),
            Some(DefaultSpec::Value(p)) => {
                if p.kind() != kind {
                    return Err(Error::KindMismatch {
                        field: decl.name.clone(),
                        key,
                        expected: kind,
                        found: p.kind(),
                    });
                }
                Some(p.clone())
            }
        };

        if index.insert(decl.name.clone(), bindings.len()).is_some() {
            return Err(Error::DuplicateField {
                type_name: schema.type_name.clone(),
                field: decl.name.clone(),
            });
        }

        bindings.push(FieldBinding {
            field: decl.name.clone(),
            key,
            kind,
            default,
            transform,
            tag: decl.tag.clone(),
            value_type,
            value_type_name,
        });
    }

    Ok(BindingSet {
        type_name: schema.type_name.clone(),
        bindings,
        index,
    })
}

/// Caching resolver.
///
/// Resolution runs once per host type name; later binds of the same type
/// share the cached `Arc<BindingSet>`. The cache takes its write lock only
/// to insert a freshly resolved set.
pub struct Resolver {
    registry: Arc<TransformRegistry>,
    cache: RwLock<HashMap<String, Arc<BindingSet>>>,
}

impl Resolver {
    /// A resolver validating transform directives against `registry`.
    pub fn new(registry: Arc<TransformRegistry>) -> Self {
        Resolver {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The registry this resolver validates against.
    pub fn registry(&self) -> &Arc<TransformRegistry> {
        &self.registry
    }

    /// Resolve `schema`, reusing the cached result for its type name.
    pub fn resolve(&self, schema: &HostSchema) -> Result<Arc<BindingSet>, Error> {
        if let Some(set) = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(schema.type_name())
        {
            return Ok(Arc::clone(set));
        }

        let set = Arc::new(resolve(schema, &self.registry)?);
        tracing::debug!(
            type_name = schema.type_name(),
            fields = set.len(),
            "resolved host schema"
        );

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        // A racing resolver may have inserted the same type meanwhile; the
        // first insert wins either way.
        Ok(Arc::clone(
            cache
                .entry(schema.type_name().to_string())
                .or_insert(set),
        ))
    }
}
