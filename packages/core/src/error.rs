//! Error types for the binding engine.

use prefstore_kv_store::{PrimitiveKind, StoreError};

use crate::transform::TransformId;

/// Which half of a transform was running when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformOp {
    Encode,
    Decode,
}

impl std::fmt::Display for TransformOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformOp::Encode => f.write_str("encode"),
            TransformOp::Decode => f.write_str("decode"),
        }
    }
}

/// Errors from the binding engine.
///
/// Resolution and registration variants are fatal for the host type or
/// transform involved. Read/write variants abort only that operation; stored
/// state is left unchanged. Every variant names the field, key, or transform
/// id it concerns so misdeclarations are diagnosable from the message alone.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A field declared zero or several storage kinds.
    #[error("field '{field}' on {type_name} declares {count} storage kinds, exactly one is required")]
    ConflictingDirectives {
        type_name: String,
        field: String,
        count: usize,
    },

    /// A field's declared value type does not match its transform's.
    #[error("transform '{transform}' on field '{field}' decodes to {transform_type}, but the field declares {declared_type}")]
    TransformTypeMismatch {
        field: String,
        transform: TransformId,
        transform_type: &'static str,
        declared_type: &'static str,
    },

    /// Two fields of one host type resolved to the same storage key.
    #[error("storage key '{key}' is bound more than once on {type_name}")]
    DuplicateKey { type_name: String, key: String },

    /// Two fields of one host type share a name.
    #[error("field '{field}' is declared more than once on {type_name}")]
    DuplicateField { type_name: String, field: String },

    /// A transform id was referenced but never registered.
    #[error("unknown transform '{0}'")]
    UnknownTransform(TransformId),

    /// A transform id was re-registered with a different value type or
    /// storage kind.
    #[error("transform '{0}' is already registered with a different value type or storage kind")]
    TransformConflict(TransformId),

    /// A stored or produced primitive has a different kind than declared.
    #[error("key '{key}' holds a {found} value, but field '{field}' is bound as {expected}")]
    KindMismatch {
        field: String,
        key: String,
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    /// A user transform failed while encoding or decoding a field.
    #[error("transform '{transform}' failed to {op} field '{field}': {source}")]
    TransformFailed {
        field: String,
        transform: TransformId,
        op: TransformOp,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A field with no default was read before its first write.
    #[error("field '{field}' (key '{key}') was read before assignment and has no default")]
    UnsetField { field: String, key: String },

    /// An accessor was asked about a field the host type never declared.
    #[error("no field named '{field}' is bound on {type_name}")]
    UnknownField { type_name: String, field: String },

    /// A typed accessor call used a different type than the field declares.
    #[error("field '{field}' holds {declared}, caller used {requested}")]
    ValueTypeMismatch {
        field: String,
        declared: &'static str,
        requested: &'static str,
    },

    /// A failure in the key-value collaborator.
    #[error(transparent)]
    Store(#[from] StoreError),
}
