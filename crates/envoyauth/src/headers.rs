//! Header directives and the shared list/map normalizer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decision::{Decision, type_name};
use crate::{Error, Result};

/// A header name and value produced by a decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Envoy `config.core.v3.HeaderValue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderValue {
    pub key: String,
    pub value: String,
}

/// Envoy `config.core.v3.HeaderValueOption`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderValueOption {
    pub header: HeaderValue,
}

impl From<HeaderEntry> for HeaderValueOption {
    fn from(entry: HeaderEntry) -> Self {
        Self {
            header: HeaderValue {
                key: entry.name,
                value: entry.value,
            },
        }
    }
}

/// Every shape a header directive may take, decoded once.
#[derive(Debug, PartialEq)]
enum HeaderShape<'a> {
    /// `["a", "b"]`
    StringList(Vec<&'a str>),
    /// `{"a": "1", "b": "2"}`
    StringMap(Vec<(&'a str, &'a str)>),
    /// `{"a": ["1", "2"], "b": "3"}`; scalar values are held as singletons.
    ListValuedMap(Vec<(&'a str, Vec<&'a str>)>),
    /// `[{"a": "1"}, {"a": "2"}]`, flattened in list order.
    EntryList(Vec<(&'a str, &'a str)>),
}

impl<'a> HeaderShape<'a> {
    fn list(key: &'static str, value: &'a Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(Error::KeyType {
                key,
                expected: "array",
                found: type_name(value),
            });
        };
        items
            .iter()
            .map(|item| expect_str(key, item))
            .collect::<Result<Vec<_>>>()
            .map(Self::StringList)
    }

    fn map(key: &'static str, value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_object(key, map),
            Value::Array(items) => {
                let mut entries = Vec::new();
                for item in items {
                    let Value::Object(map) = item else {
                        return Err(Error::ElementType {
                            key,
                            expected: "object",
                            found: type_name(item),
                        });
                    };
                    for (name, values) in object_values(key, map)? {
                        entries.extend(values.into_iter().map(|v| (name, v)));
                    }
                }
                Ok(Self::EntryList(entries))
            }
            other => Err(Error::KeyType {
                key,
                expected: "object",
                found: type_name(other),
            }),
        }
    }

    fn from_object(key: &'static str, map: &'a Map<String, Value>) -> Result<Self> {
        if let Some(pairs) = map
            .iter()
            .map(|(name, v)| v.as_str().map(|s| (name.as_str(), s)))
            .collect::<Option<Vec<_>>>()
        {
            return Ok(Self::StringMap(pairs));
        }
        object_values(key, map).map(Self::ListValuedMap)
    }

    fn into_names(self) -> Vec<String> {
        match self {
            Self::StringList(names) => names.into_iter().map(str::to_owned).collect(),
            other => other
                .into_entries()
                .into_iter()
                .map(|entry| entry.name)
                .collect(),
        }
    }

    fn into_entries(self) -> Vec<HeaderEntry> {
        match self {
            Self::StringList(names) => names
                .into_iter()
                .map(|name| HeaderEntry::new(name, ""))
                .collect(),
            Self::StringMap(pairs) | Self::EntryList(pairs) => pairs
                .into_iter()
                .map(|(name, value)| HeaderEntry::new(name, value))
                .collect(),
            Self::ListValuedMap(groups) => groups
                .into_iter()
                .flat_map(|(name, values)| {
                    values.into_iter().map(move |value| HeaderEntry::new(name, value))
                })
                .collect(),
        }
    }
}

fn object_values<'a>(
    key: &'static str,
    map: &'a Map<String, Value>,
) -> Result<Vec<(&'a str, Vec<&'a str>)>> {
    map.iter()
        .map(|(name, value)| {
            let values = match value {
                Value::String(s) => vec![s.as_str()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| expect_str(key, item))
                    .collect::<Result<Vec<_>>>()?,
                other => {
                    return Err(Error::ElementType {
                        key,
                        expected: "string",
                        found: type_name(other),
                    });
                }
            };
            Ok((name.as_str(), values))
        })
        .collect()
}

fn expect_str<'a>(key: &'static str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| Error::ElementType {
        key,
        expected: "string",
        found: type_name(value),
    })
}

/// Decode a list-of-strings directive (list mode).
pub(crate) fn string_list(decision: &Decision<'_>, key: &'static str) -> Result<Vec<String>> {
    match decision.field(key)? {
        None => Ok(Vec::new()),
        Some(value) => Ok(HeaderShape::list(key, value)?.into_names()),
    }
}

/// Decode a header map directive (map/fan-out mode).
pub(crate) fn header_entries(decision: &Decision<'_>, key: &'static str) -> Result<Vec<HeaderEntry>> {
    match decision.field(key)? {
        None => Ok(Vec::new()),
        Some(value) => Ok(HeaderShape::map(key, value)?.into_entries()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::RESPONSE_HEADERS_TO_ADD as KEY;
    use serde_json::json;

    fn decode(value: Value) -> Result<Vec<HeaderEntry>> {
        header_entries(&Decision::classify(&value), KEY)
    }

    #[test]
    fn shape_string_map() {
        let value = json!({"foo": "bar", "baz": "qux"});
        let shape = HeaderShape::map(KEY, &value).unwrap();
        assert!(matches!(shape, HeaderShape::StringMap(ref p) if p.len() == 2));
    }

    #[test]
    fn shape_mixed_map_is_list_valued() {
        let value = json!({"foo": ["a", "b"], "bar": "c"});
        let shape = HeaderShape::map(KEY, &value).unwrap();
        let HeaderShape::ListValuedMap(groups) = &shape else {
            panic!("expected list-valued map, got {shape:?}");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(shape.into_entries().len(), 3);
    }

    #[test]
    fn entry_list_keeps_order_and_duplicates() {
        let entries = decode(json!({KEY: [{"foo": "bar"}, {"foo": "baz"}]})).unwrap();
        assert_eq!(
            entries,
            vec![HeaderEntry::new("foo", "bar"), HeaderEntry::new("foo", "baz")]
        );
    }

    #[test]
    fn list_valued_map_fans_out() {
        let entries = decode(json!({KEY: {"foo": ["bar", "baz"]}})).unwrap();
        assert_eq!(
            entries,
            vec![HeaderEntry::new("foo", "bar"), HeaderEntry::new("foo", "baz")]
        );
    }

    #[test]
    fn entry_list_element_may_fan_out() {
        let entries = decode(json!({KEY: [{"a": ["1", "2"]}, {"b": "3"}]})).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2], HeaderEntry::new("b", "3"));
    }

    #[test]
    fn rejects_bare_string() {
        assert!(matches!(
            decode(json!({KEY: "test"})),
            Err(Error::KeyType { found: "string", .. })
        ));
    }

    #[test]
    fn rejects_non_string_leaf() {
        assert!(matches!(
            decode(json!({KEY: {"foo": "bar", "baz": 1}})),
            Err(Error::ElementType { found: "number", .. })
        ));
        assert!(matches!(
            decode(json!({KEY: {"foo": ["bar", true]}})),
            Err(Error::ElementType { found: "boolean", .. })
        ));
    }

    #[test]
    fn rejects_non_map_list_element() {
        assert!(matches!(
            decode(json!({KEY: ["foo"]})),
            Err(Error::ElementType { expected: "object", .. })
        ));
    }

    #[test]
    fn string_list_mode() {
        let value = json!({"names": ["foo", "bar", "fuz"]});
        let names = string_list(&Decision::classify(&value), "names").unwrap();
        assert_eq!(names, vec!["foo", "bar", "fuz"]);

        let value = json!({"names": [1]});
        assert!(matches!(
            string_list(&Decision::classify(&value), "names"),
            Err(Error::ElementType { .. })
        ));

        let value = json!({"names": "test"});
        assert!(matches!(
            string_list(&Decision::classify(&value), "names"),
            Err(Error::KeyType { .. })
        ));
    }

    #[test]
    fn header_value_option_carries_value() {
        let option = HeaderValueOption::from(HeaderEntry::new("x-id", "42"));
        assert_eq!(option.header.key, "x-id");
        assert_eq!(option.header.value, "42");
    }
}
