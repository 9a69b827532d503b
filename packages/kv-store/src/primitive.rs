//! The Primitive type - the storable value representation.

use std::fmt;

/// The kind of a storable primitive.
///
/// The keyspace supports exactly these five kinds. A key, once written,
/// always holds the kind its binding declared; the layers above never
/// coerce across kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit floating point.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
}

impl PrimitiveKind {
    /// The kind's name, as used in error messages and the file format.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::String => "string",
        }
    }

    /// The zero value of this kind: `0`, `0`, `0.0`, `false`, `""`.
    pub fn zero(&self) -> Primitive {
        match self {
            PrimitiveKind::Int => Primitive::Int(0),
            PrimitiveKind::Long => Primitive::Long(0),
            PrimitiveKind::Float => Primitive::Float(0.0),
            PrimitiveKind::Bool => Primitive::Bool(false),
            PrimitiveKind::String => Primitive::String(String::new()),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A storable value.
///
/// This is what the key-value collaborator holds and what transforms encode
/// into. Equality is structural; the binding layer uses it for write
/// change-detection.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Int(i32),
    Long(i64),
    Float(f32),
    Bool(bool),
    String(String),
}

impl Primitive {
    /// The kind of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Int(_) => PrimitiveKind::Int,
            Primitive::Long(_) => PrimitiveKind::Long,
            Primitive::Float(_) => PrimitiveKind::Float,
            Primitive::Bool(_) => PrimitiveKind::Bool,
            Primitive::String(_) => PrimitiveKind::String,
        }
    }

    /// The inner integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Primitive::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The inner long, if this is a `Long`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Primitive::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The inner float, if this is a `Float`.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Primitive::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The inner boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The inner string slice, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Int(v) => write!(f, "{}", v),
            Primitive::Long(v) => write!(f, "{}", v),
            Primitive::Float(v) => write!(f, "{}", v),
            Primitive::Bool(v) => write!(f, "{}", v),
            Primitive::String(v) => f.write_str(v),
        }
    }
}

// Conversion from the native types each kind stores

impl From<i32> for Primitive {
    fn from(v: i32) -> Self {
        Primitive::Int(v)
    }
}

impl From<i64> for Primitive {
    fn from(v: i64) -> Self {
        Primitive::Long(v)
    }
}

impl From<f32> for Primitive {
    fn from(v: f32) -> Self {
        Primitive::Float(v)
    }
}

impl From<bool> for Primitive {
    fn from(v: bool) -> Self {
        Primitive::Bool(v)
    }
}

impl From<String> for Primitive {
    fn from(v: String) -> Self {
        Primitive::String(v)
    }
}

impl From<&str> for Primitive {
    fn from(v: &str) -> Self {
        Primitive::String(v.to_string())
    }
}
