//! Dynamic metadata encoding.
//!
//! Envoy carries dynamic metadata as a `google.protobuf.Struct`. The decision
//! value is converted into the equivalent [`Struct`] / [`StructValue`] tree:
//! numbers become doubles, arrays become lists, objects become nested structs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decision::{DYNAMIC_METADATA, Decision, type_name};
use crate::{Error, Result};

/// Maximum nesting depth accepted for metadata, matching protobuf's
/// default recursion limit.
pub const MAX_METADATA_DEPTH: usize = 100;

/// `google.protobuf.Struct`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Struct {
    pub fields: BTreeMap<String, StructValue>,
}

impl Struct {
    pub fn get(&self, name: &str) -> Option<&StructValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// `google.protobuf.Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<StructValue>),
    Struct(Struct),
}

impl StructValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Decode `dynamic_metadata`. Requires a mapping decision.
pub(crate) fn dynamic_metadata(decision: &Decision<'_>) -> Result<Option<Struct>> {
    let Some(value) = decision.mapping_field(DYNAMIC_METADATA)? else {
        return Ok(None);
    };
    let Value::Object(map) = value else {
        return Err(Error::KeyType {
            key: DYNAMIC_METADATA,
            expected: "object",
            found: type_name(value),
        });
    };

    let mut path = vec![DYNAMIC_METADATA.to_string()];
    to_struct(map, &mut path).map(Some)
}

fn to_struct(map: &Map<String, Value>, path: &mut Vec<String>) -> Result<Struct> {
    let mut fields = BTreeMap::new();
    for (name, value) in map {
        path.push(name.clone());
        fields.insert(name.clone(), to_value(value, path)?);
        path.pop();
    }
    Ok(Struct { fields })
}

fn to_value(value: &Value, path: &mut Vec<String>) -> Result<StructValue> {
    if path.len() > MAX_METADATA_DEPTH {
        return Err(structure_error(
            path,
            format!("nesting exceeds {MAX_METADATA_DEPTH} levels"),
        ));
    }

    Ok(match value {
        Value::Null => StructValue::Null,
        Value::Bool(b) => StructValue::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => StructValue::Number(f),
            None => {
                return Err(structure_error(
                    path,
                    format!("number {n} is not representable as a double"),
                ));
            }
        },
        Value::String(s) => StructValue::String(s.clone()),
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push(i.to_string());
                list.push(to_value(item, path)?);
                path.pop();
            }
            StructValue::List(list)
        }
        Value::Object(map) => StructValue::Struct(to_struct(map, path)?),
    })
}

fn structure_error(path: &[String], reason: String) -> Error {
    Error::Structure {
        path: path.join("."),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<Option<Struct>> {
        dynamic_metadata(&Decision::classify(&value))
    }

    #[test]
    fn absent_is_none() {
        assert_eq!(decode(json!({})).unwrap(), None);
    }

    #[test]
    fn string_field() {
        let metadata = decode(json!({"dynamic_metadata": {"foo": "bar"}}))
            .unwrap()
            .unwrap();
        let mut expected = Struct::default();
        expected
            .fields
            .insert("foo".to_string(), StructValue::String("bar".to_string()));
        assert_eq!(metadata, expected);
    }

    #[test]
    fn nested_values() {
        let metadata = decode(json!({
            "dynamic_metadata": {
                "n": 3,
                "flag": false,
                "none": null,
                "list": ["a", 1.5, {"deep": true}],
            }
        }))
        .unwrap()
        .unwrap();

        assert_eq!(metadata.get("n"), Some(&StructValue::Number(3.0)));
        assert_eq!(metadata.get("flag"), Some(&StructValue::Bool(false)));
        assert_eq!(metadata.get("none"), Some(&StructValue::Null));
        let Some(StructValue::List(list)) = metadata.get("list") else {
            panic!("expected list");
        };
        assert_eq!(list[0].as_str(), Some("a"));
        assert_eq!(list[1], StructValue::Number(1.5));
        assert!(matches!(&list[2], StructValue::Struct(s) if s.len() == 1));
    }

    #[test]
    fn boolean_root_is_rejected() {
        assert!(matches!(decode(json!(true)), Err(Error::Shape { .. })));
        assert!(matches!(decode(json!("x")), Err(Error::Shape { .. })));
    }

    #[test]
    fn non_object_metadata_is_rejected() {
        assert!(matches!(
            decode(json!({"dynamic_metadata": ["foo"]})),
            Err(Error::KeyType { found: "array", .. })
        ));
    }

    #[test]
    fn too_deep_is_rejected() {
        let mut value = json!("leaf");
        for _ in 0..=MAX_METADATA_DEPTH {
            value = json!({ "n": value });
        }
        let err = decode(json!({ "dynamic_metadata": value })).unwrap_err();
        let Error::Structure { path, .. } = err else {
            panic!("expected structure error, got {err:?}");
        };
        assert!(path.starts_with("dynamic_metadata.n.n"));
    }

    #[test]
    fn serializes_as_plain_json() {
        let metadata = decode(json!({"dynamic_metadata": {"a": [1, "b"]}}))
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            json!({"a": [1.0, "b"]})
        );
    }
}
