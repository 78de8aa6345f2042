//! Query parameter directives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decision::{Decision, QUERY_PARAMETERS_TO_SET, type_name};
use crate::{Error, Result};

/// Envoy `config.core.v3.QueryParameter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub key: String,
    pub value: String,
}

/// Decode `query_parameters_to_set`.
///
/// Unlike header directives, only a list of `{"key": .., "value": ..}`
/// objects is accepted, and the output keeps the list order.
pub(crate) fn parameters_to_set(decision: &Decision<'_>) -> Result<Vec<QueryParameter>> {
    const KEY: &str = QUERY_PARAMETERS_TO_SET;

    let Some(value) = decision.field(KEY)? else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = value else {
        return Err(Error::KeyType {
            key: KEY,
            expected: "array",
            found: type_name(value),
        });
    };

    items.iter().map(parameter).collect()
}

fn parameter(item: &Value) -> Result<QueryParameter> {
    const KEY: &str = QUERY_PARAMETERS_TO_SET;

    let Value::Object(map) = item else {
        return Err(Error::ElementType {
            key: KEY,
            expected: "object",
            found: type_name(item),
        });
    };
    if map.keys().any(|k| k.as_str() != "key" && k.as_str() != "value") {
        return Err(Error::ElementType {
            key: KEY,
            expected: "object with only 'key' and 'value'",
            found: "extra field",
        });
    }

    let field = |name: &str| match map.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::ElementType {
            key: KEY,
            expected: "string",
            found: type_name(other),
        }),
        None => Err(Error::ElementType {
            key: KEY,
            expected: "object with 'key' and 'value'",
            found: "missing field",
        }),
    };

    Ok(QueryParameter {
        key: field("key")?,
        value: field("value")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<Vec<QueryParameter>> {
        parameters_to_set(&Decision::classify(&value))
    }

    fn param(key: &str, value: &str) -> QueryParameter {
        QueryParameter {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn bool_and_empty_decisions() {
        assert_eq!(decode(json!(true)).unwrap(), vec![]);
        assert_eq!(decode(json!({})).unwrap(), vec![]);
    }

    #[test]
    fn invalid_decision() {
        assert!(matches!(decode(json!("hello")), Err(Error::Shape { .. })));
    }

    #[test]
    fn preserves_order() {
        let result = decode(json!({
            "query_parameters_to_set": [
                {"key": "abc", "value": "123"},
                {"key": "xyz", "value": "987"},
            ]
        }))
        .unwrap();
        assert_eq!(result, vec![param("abc", "123"), param("xyz", "987")]);
    }

    #[test]
    fn rejects_strings() {
        assert!(matches!(
            decode(json!({"query_parameters_to_set": "test"})),
            Err(Error::KeyType { .. })
        ));
        assert!(matches!(
            decode(json!({"query_parameters_to_set": ["foo", "bar"]})),
            Err(Error::ElementType { expected: "object", .. })
        ));
    }

    #[test]
    fn rejects_malformed_entries() {
        for entry in [
            json!({"key": "abc"}),
            json!({"key": "abc", "value": 1}),
            json!({"key": "abc", "value": "1", "extra": "x"}),
        ] {
            assert!(
                decode(json!({"query_parameters_to_set": [entry.clone()]})).is_err(),
                "accepted {entry}"
            );
        }
    }
}
