//! The Transform trait and transform identifiers.

use std::borrow::Cow;
use std::fmt;

use prefstore_kv_store::{Primitive, PrimitiveKind};

/// Identifies a registered transform.
///
/// Ids are opaque strings; constants can be built at no cost from static
/// strings.
///
/// ```rust
/// use prefstore_core::TransformId;
///
/// const JSON_CUSTOM: TransformId = TransformId::from_static("json.custom");
/// assert_eq!(JSON_CUSTOM.as_str(), "json.custom");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransformId(pub Cow<'static, str>);

impl TransformId {
    /// Create an id from a static string.
    pub const fn from_static(s: &'static str) -> Self {
        TransformId(Cow::Borrowed(s))
    }

    /// Create an id from an owned string.
    pub fn new(s: impl Into<String>) -> Self {
        TransformId(Cow::Owned(s.into()))
    }

    /// Get the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TransformId {
    fn from(s: &'static str) -> Self {
        TransformId(Cow::Borrowed(s))
    }
}

impl From<String> for TransformId {
    fn from(s: String) -> Self {
        TransformId(Cow::Owned(s))
    }
}

/// The result of a user-supplied encode or decode.
///
/// Failures are arbitrary boxed errors; the engine wraps them in
/// [`Error::TransformFailed`](crate::Error::TransformFailed) together with
/// the field and transform id involved.
pub type TransformResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Converts between a typed value and its stored primitive.
///
/// Both directions must be pure: no side effects, and
/// `decode(encode(v))` structurally equal to `v` for every legal `v`.
/// `storage_kind` names the primitive kind `encode` produces; a binding
/// using this transform must declare the same kind.
///
/// # Implementing
///
/// ```rust
/// use prefstore_core::{Transform, TransformResult};
/// use prefstore_kv_store::{Primitive, PrimitiveKind};
///
/// /// Stores a duration in seconds as a long.
/// struct SecondsTransform;
///
/// impl Transform for SecondsTransform {
///     type Value = std::time::Duration;
///
///     fn storage_kind(&self) -> PrimitiveKind {
///         PrimitiveKind::Long
///     }
///
///     fn encode(&self, value: &Self::Value) -> TransformResult<Primitive> {
///         Ok(Primitive::Long(value.as_secs() as i64))
///     }
///
///     fn decode(&self, stored: &Primitive) -> TransformResult<Self::Value> {
///         let secs = stored.as_long().ok_or("seconds must be stored as long")?;
///         Ok(std::time::Duration::from_secs(secs as u64))
///     }
/// }
/// ```
pub trait Transform: Send + Sync + 'static {
    /// The decoded value type.
    type Value: Send + Sync + 'static;

    /// The primitive kind `encode` produces and `decode` consumes.
    fn storage_kind(&self) -> PrimitiveKind;

    /// Encode a value into its stored primitive.
    fn encode(&self, value: &Self::Value) -> TransformResult<Primitive>;

    /// Decode a stored primitive back into a value.
    fn decode(&self, stored: &Primitive) -> TransformResult<Self::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperTransform;

    impl Transform for UpperTransform {
        type Value = String;

        fn storage_kind(&self) -> PrimitiveKind {
            PrimitiveKind::String
        }

        fn encode(&self, value: &String) -> TransformResult<Primitive> {
            Ok(Primitive::String(value.to_uppercase()))
        }

        fn decode(&self, stored: &Primitive) -> TransformResult<String> {
            let s = stored.as_str().ok_or("expected string storage")?;
            Ok(s.to_lowercase())
        }
    }

    #[test]
    fn roundtrip() {
        let t = UpperTransform;
        let encoded = t.encode(&"hello".to_string()).unwrap();
        assert_eq!(encoded, Primitive::String("HELLO".to_string()));
        assert_eq!(t.decode(&encoded).unwrap(), "hello");
    }

    #[test]
    fn decode_rejects_wrong_kind() {
        let t = UpperTransform;
        assert!(t.decode(&Primitive::Int(1)).is_err());
    }

    #[test]
    fn id_equality_and_display() {
        let a = TransformId::from("json");
        let b = TransformId::new("json".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "json");
    }
}
