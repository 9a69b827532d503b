//! Primitive to JSON entry conversion.
//!
//! Each stored primitive becomes a single-key object tagging its kind, e.g.
//! `{"long": 7}`. Plain JSON numbers cannot distinguish int, long, and
//! float, so the tag is what lets every kind survive a save/load cycle
//! exactly.

use serde_json::{json, Value as JsonValue};

use prefstore_kv_store::Primitive;

/// Encode a primitive as its kind-tagged JSON entry.
pub(crate) fn primitive_to_json(primitive: &Primitive) -> JsonValue {
    match primitive {
        Primitive::Int(v) => json!({ "int": v }),
        Primitive::Long(v) => json!({ "long": v }),
        Primitive::Float(v) => json!({ "float": v }),
        Primitive::Bool(v) => json!({ "bool": v }),
        Primitive::String(v) => json!({ "string": v }),
    }
}

/// Decode a kind-tagged JSON entry back into a primitive.
///
/// `None` for anything that is not a single-key object with a known kind
/// tag and a value of the tagged type.
pub(crate) fn json_to_primitive(value: &JsonValue) -> Option<Primitive> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    let (tag, inner) = map.iter().next()?;
    match tag.as_str() {
        "int" => inner
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Primitive::Int),
        "long" => inner.as_i64().map(Primitive::Long),
        "float" => inner.as_f64().map(|v| Primitive::Float(v as f32)),
        "bool" => inner.as_bool().map(Primitive::Bool),
        "string" => inner.as_str().map(|s| Primitive::String(s.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_roundtrips() {
        let primitives = [
            Primitive::Int(-3),
            Primitive::Long(1 << 40),
            Primitive::Float(1.25),
            Primitive::Bool(true),
            Primitive::String("hello".to_string()),
        ];
        for p in primitives {
            let encoded = primitive_to_json(&p);
            assert_eq!(json_to_primitive(&encoded), Some(p));
        }
    }

    #[test]
    fn kinds_stay_distinct() {
        // 7 as int and 7 as long must not collapse into one another.
        let int = primitive_to_json(&Primitive::Int(7));
        let long = primitive_to_json(&Primitive::Long(7));
        assert_ne!(int, long);
        assert_eq!(json_to_primitive(&int), Some(Primitive::Int(7)));
        assert_eq!(json_to_primitive(&long), Some(Primitive::Long(7)));
    }

    #[test]
    fn rejects_untagged_values() {
        assert_eq!(json_to_primitive(&json!(7)), None);
        assert_eq!(json_to_primitive(&json!("x")), None);
        assert_eq!(json_to_primitive(&json!({ "int": 1, "long": 2 })), None);
        assert_eq!(json_to_primitive(&json!({ "short": 1 })), None);
        assert_eq!(json_to_primitive(&json!({ "int": "seven" })), None);
    }

    #[test]
    fn rejects_int_out_of_range() {
        let too_big = json!({ "int": i64::from(i32::MAX) + 1 });
        assert_eq!(json_to_primitive(&too_big), None);
    }
}
