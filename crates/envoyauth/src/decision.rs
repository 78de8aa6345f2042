//! Classification of the raw policy decision.

use serde_json::{Map, Value};

use crate::{Error, Result};

pub const ALLOWED: &str = "allowed";
pub const REQUEST_HEADERS_TO_REMOVE: &str = "request_headers_to_remove";
pub const RESPONSE_HEADERS_TO_ADD: &str = "response_headers_to_add";
pub const HEADERS: &str = "headers";
pub const BODY: &str = "body";
pub const HTTP_STATUS: &str = "http_status";
pub const DYNAMIC_METADATA: &str = "dynamic_metadata";
pub const QUERY_PARAMETERS_TO_SET: &str = "query_parameters_to_set";
pub const QUERY_PARAMETERS_TO_REMOVE: &str = "query_parameters_to_remove";

/// The root shape of a decision.
///
/// Policies may return a bare boolean as shorthand for "allow/deny with no
/// further directives", or a mapping carrying the directive keys. Everything
/// else is rejected by every decoder.
#[derive(Debug, Clone, Copy)]
pub enum Decision<'a> {
    Boolean(bool),
    Mapping(&'a Map<String, Value>),
    Invalid(&'a Value),
}

impl<'a> Decision<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Bool(b) => Self::Boolean(*b),
            Value::Object(map) => Self::Mapping(map),
            other => Self::Invalid(other),
        }
    }

    /// Look up an optional directive key.
    ///
    /// Returns `Ok(None)` for a boolean root or an absent key, and a shape
    /// error for a root that is neither boolean nor mapping.
    pub fn field(&self, key: &str) -> Result<Option<&'a Value>> {
        match self {
            Self::Boolean(_) => Ok(None),
            Self::Mapping(map) => Ok(map.get(key)),
            Self::Invalid(value) => Err(shape_error(value)),
        }
    }

    /// Like [`Decision::field`], but a boolean root is a shape error.
    pub fn mapping_field(&self, key: &str) -> Result<Option<&'a Value>> {
        match self {
            Self::Mapping(map) => Ok(map.get(key)),
            Self::Boolean(_) => Err(Error::Shape { found: "boolean" }),
            Self::Invalid(value) => Err(shape_error(value)),
        }
    }
}

pub(crate) fn shape_error(value: &Value) -> Error {
    Error::Shape {
        found: type_name(value),
    }
}

/// JSON type name used in error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_roots() {
        assert!(matches!(Decision::classify(&json!(true)), Decision::Boolean(true)));
        assert!(matches!(Decision::classify(&json!({})), Decision::Mapping(_)));
        assert!(matches!(Decision::classify(&json!("hello")), Decision::Invalid(_)));
        assert!(matches!(Decision::classify(&json!(null)), Decision::Invalid(_)));
    }

    #[test]
    fn field_on_boolean_root_is_absent() {
        let value = json!(false);
        let decision = Decision::classify(&value);
        assert_eq!(decision.field(BODY).unwrap(), None);
        assert_eq!(
            decision.mapping_field(BODY).unwrap_err(),
            Error::Shape { found: "boolean" }
        );
    }

    #[test]
    fn field_on_invalid_root_errors() {
        let value = json!([1, 2]);
        let decision = Decision::classify(&value);
        assert_eq!(
            decision.field(BODY).unwrap_err(),
            Error::Shape { found: "array" }
        );
    }
}
