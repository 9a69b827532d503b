//! The structural host-type description the resolver consumes.
//!
//! A directive-parsing front end (a derive macro, a config loader, plain
//! startup code) produces a [`HostSchema`] describing the fields a host type
//! declares. The builder keeps declaration order; resolution turns it into a
//! [`BindingSet`](crate::BindingSet).

use std::any::TypeId;

use prefstore_kv_store::{Primitive, PrimitiveKind};

use crate::transform::TransformId;

/// How a field's default is declared.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultSpec {
    /// The kind's zero value: `0`, `0.0`, `false`, `""`.
    TypeDefault,
    /// An explicit primitive; must match the field's storage kind.
    Value(Primitive),
}

/// A transform directive on a field: the transform id plus the value type
/// the field declares, checked against the registered transform at
/// resolution time.
#[derive(Clone, Debug)]
pub(crate) struct TransformDecl {
    pub(crate) id: TransformId,
    pub(crate) value_type: TypeId,
    pub(crate) value_type_name: &'static str,
}

/// One declared field.
///
/// A declaration accumulates storage-kind directives rather than holding
/// exactly one, so a front end can hand over whatever the host type said and
/// let resolution reject the zero- and many-kind cases.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub(crate) name: String,
    pub(crate) kinds: Vec<PrimitiveKind>,
    pub(crate) key: Option<String>,
    pub(crate) default: Option<DefaultSpec>,
    pub(crate) transform: Option<TransformDecl>,
    pub(crate) tag: Option<String>,
}

impl FieldDecl {
    /// A declaration with no storage kind yet; add one with
    /// [`store_as`](Self::store_as).
    pub fn new(name: impl Into<String>) -> Self {
        FieldDecl {
            name: name.into(),
            kinds: Vec::new(),
            key: None,
            default: None,
            transform: None,
            tag: None,
        }
    }

    /// An int field.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name).store_as(PrimitiveKind::Int)
    }

    /// A long field.
    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name).store_as(PrimitiveKind::Long)
    }

    /// A float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name).store_as(PrimitiveKind::Float)
    }

    /// A boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name).store_as(PrimitiveKind::Bool)
    }

    /// A string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name).store_as(PrimitiveKind::String)
    }

    /// Add a storage-kind directive.
    ///
    /// Resolution requires exactly one on each field.
    pub fn store_as(mut self, kind: PrimitiveKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Override the storage key; the field name is used when absent.
    pub fn named(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Default to the kind's zero value when the key is unset.
    pub fn type_default(mut self) -> Self {
        self.default = Some(DefaultSpec::TypeDefault);
        self
    }

    /// Default to `value` when the key is unset.
    ///
    /// The value's kind must match the field's storage kind; resolution
    /// rejects the declaration otherwise.
    pub fn default_value(mut self, value: impl Into<Primitive>) -> Self {
        self.default = Some(DefaultSpec::Value(value.into()));
        self
    }

    /// Route the field through the transform registered under `id`,
    /// declaring `T` as the field's value type.
    ///
    /// Resolution checks `T` against the transform's decoded type and the
    /// field's storage kind against the transform's.
    pub fn transform<T: Send + Sync + 'static>(mut self, id: impl Into<TransformId>) -> Self {
        self.transform = Some(TransformDecl {
            id: id.into(),
            value_type: TypeId::of::<T>(),
            value_type_name: std::any::type_name::<T>(),
        });
        self
    }

    /// Tag the field: a write that changes its stored value publishes the
    /// new value to every subscriber of `tag`.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The declared field name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A host type's declared fields, in declaration order.
///
/// # Example
///
/// ```rust
/// use prefstore_core::{FieldDecl, HostSchema};
///
/// let schema = HostSchema::new("PlayerSettings")
///     .field(FieldDecl::int("volume").default_value(80).tag("audio"))
///     .field(FieldDecl::string("nickname"))
///     .field(FieldDecl::boolean("muted").type_default().named("audio_muted"));
///
/// assert_eq!(schema.type_name(), "PlayerSettings");
/// assert_eq!(schema.fields().count(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct HostSchema {
    pub(crate) type_name: String,
    pub(crate) fields: Vec<FieldDecl>,
}

impl HostSchema {
    /// A schema for the host type named `type_name`.
    ///
    /// The name identifies the host type in the resolver cache and in
    /// resolution errors.
    pub fn new(type_name: impl Into<String>) -> Self {
        HostSchema {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field declaration.
    pub fn field(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    /// The host type's name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.iter()
    }
}
