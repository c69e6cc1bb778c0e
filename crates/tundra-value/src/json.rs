//! JSON interop
//!
//! Conversion from [`serde_json::Value`] and a [`Serialize`] implementation
//! that follows JSON-export conventions: `Undefined` and callables vanish
//! from records and become `null` in arrays. Views serialize through
//! [`Value::peek`], so exporting a wrapper never stages a change.

use crate::node::{Node, Shape};
use crate::value::Value;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

impl Value {
    /// Export as a JSON tree
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn is_omitted_in_records(&self) -> bool {
        matches!(self, Self::Undefined | Self::Callable(_))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Node(Node::from_items(items.into_iter().map(Self::from)))
            }
            serde_json::Value::Object(map) => Self::Node(Node::from_entries(
                map.into_iter().map(|(k, v)| (k, Self::from(v))),
            )),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null | Self::Callable(_) => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Timestamp(t) => serializer.serialize_str(&t.to_rfc3339()),
            Self::Pattern(p) => serializer.serialize_str(p.as_str()),
            Self::Map(m) => serializer.collect_map(m.iter()),
            Self::Set(s) => serializer.collect_seq(s.iter()),
            Self::Binary(b) => serializer.serialize_str(&hex::encode(b.as_bytes())),
            Self::Pending(p) => match p.value() {
                Some(value) => value.serialize(serializer),
                None => serializer.serialize_unit(),
            },
            Self::Error(e) => serializer.serialize_str(&e.message()),
            Self::Node(_) | Self::View(_) => serialize_composite(self, serializer),
        }
    }
}

fn serialize_composite<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    let entries = value.entries();
    if value.shape() == Some(Shape::Array) {
        let mut seq = serializer.serialize_seq(Some(entries.len()))?;
        for (_, item) in &entries {
            seq.serialize_element(item)?;
        }
        return seq.end();
    }

    let kept: Vec<_> = entries
        .iter()
        .filter(|(_, v)| !v.is_omitted_in_records())
        .collect();
    let mut map = serializer.serialize_map(Some(kept.len()))?;
    for (key, item) in kept {
        map.serialize_entry(&key.to_field(), item)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opaque::{Binary, Callable, Pending};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_plain_data() {
        let source = json!({"a": 1, "list": [true, null, "x"], "nested": {"f": 1.5}});
        let value = Value::from(source.clone());
        assert_eq!(value.to_json().unwrap(), source);
    }

    #[test]
    fn undefined_and_callables_are_omitted_from_records() {
        let value = Value::record([
            ("keep", Value::from(1)),
            ("gone", Value::Undefined),
            ("f", Value::from(Callable::new(|_| Value::Null))),
        ]);
        assert_eq!(value.to_json().unwrap(), json!({"keep": 1}));
    }

    #[test]
    fn holes_export_as_null() {
        let value = Value::array([Value::from(1), Value::Undefined]);
        assert_eq!(value.to_json().unwrap(), json!([1, null]));
    }

    #[test]
    fn opaque_leaves_export_unmodified() {
        let value = Value::record([
            ("bin", Value::from(Binary::new(vec![0xde_u8, 0xad]))),
            ("later", Value::from(Pending::resolved(Value::from("done")))),
        ]);
        assert_eq!(
            value.to_json().unwrap(),
            json!({"bin": "dead", "later": "done"})
        );
    }
}
