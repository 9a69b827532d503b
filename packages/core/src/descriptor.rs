//! Resolved binding metadata.

use std::any::TypeId;
use std::collections::HashMap;

use prefstore_kv_store::{Primitive, PrimitiveKind};

use crate::transform::TransformId;

/// The resolved, immutable binding of one field.
///
/// Produced by the resolver, never modified afterwards. Carries everything
/// the accessor needs to translate a typed field access into a key-value
/// operation: the storage key, the declared kind, the optional default,
/// the optional transform, and the optional change tag.
#[derive(Debug)]
pub struct FieldBinding {
    pub(crate) field: String,
    pub(crate) key: String,
    pub(crate) kind: PrimitiveKind,
    pub(crate) default: Option<Primitive>,
    pub(crate) transform: Option<TransformId>,
    pub(crate) tag: Option<String>,
    pub(crate) value_type: TypeId,
    pub(crate) value_type_name: &'static str,
}

impl FieldBinding {
    /// The declared field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The storage key backing the field.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The declared primitive kind.
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// The default returned when the key is unset, if one was declared.
    pub fn default(&self) -> Option<&Primitive> {
        self.default.as_ref()
    }

    /// The transform routing this field, if any.
    pub fn transform(&self) -> Option<&TransformId> {
        self.transform.as_ref()
    }

    /// The change tag published on writes, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Name of the Rust type the typed accessors expect for this field.
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }
}

/// A host type's resolved bindings, in field-declaration order.
///
/// Storage keys and field names are unique within a set; both are checked
/// at resolution time. Shared via `Arc` between every accessor bound to the
/// host type.
#[derive(Debug)]
pub struct BindingSet {
    pub(crate) type_name: String,
    pub(crate) bindings: Vec<FieldBinding>,
    pub(crate) index: HashMap<String, usize>,
}

impl BindingSet {
    /// The host type's name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Look up a binding by field name.
    pub fn get(&self, field: &str) -> Option<&FieldBinding> {
        self.index.get(field).map(|i| &self.bindings[*i])
    }

    /// Iterate bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldBinding> {
        self.bindings.iter()
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the set binds no fields.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(field: &str, key: &str) -> FieldBinding {
        FieldBinding {
            field: field.to_string(),
            key: key.to_string(),
            kind: PrimitiveKind::Int,
            default: None,
            transform: None,
            tag: None,
            value_type: TypeId::of::<i32>(),
            value_type_name: "i32",
        }
    }

    #[test]
    fn lookup_and_order() {
        let bindings = vec![binding("b", "kb"), binding("a", "ka")];
        let index = bindings
            .iter()
            .enumerate()
            .map(|(i, b)| (b.field.clone(), i))
            .collect();
        let set = BindingSet {
            type_name: "T".to_string(),
            bindings,
            index,
        };

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").map(|b| b.key()), Some("ka"));
        assert!(set.get("missing").is_none());

        // Declaration order survives the index.
        let order: Vec<&str> = set.iter().map(|b| b.field()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
