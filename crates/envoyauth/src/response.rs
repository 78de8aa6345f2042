//! Assembly of a complete check response from a decision.

use serde::Serialize;

use crate::decision::Decision;
use crate::headers::{HeaderEntry, HeaderValueOption};
use crate::metadata::Struct;
use crate::query::QueryParameter;
use crate::status::HttpStatus;
use crate::{EvalResult, Result};

/// Directives for an allowed request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OkResponse {
    pub headers: Vec<HeaderValueOption>,
    pub headers_to_remove: Vec<String>,
    pub response_headers_to_add: Vec<HeaderEntry>,
    pub query_parameters_to_set: Vec<QueryParameter>,
    pub query_parameters_to_remove: Vec<String>,
}

/// Directives for a denied request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeniedResponse {
    pub status: HttpStatus,
    pub headers: Vec<HeaderValueOption>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HttpResponse {
    Ok(OkResponse),
    Denied(DeniedResponse),
}

/// Envoy `service.auth.v3.CheckResponse`, minus the transport envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResponse {
    pub decision_id: String,
    pub allowed: bool,
    #[serde(flatten)]
    pub http_response: HttpResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_metadata: Option<Struct>,
}

impl EvalResult {
    /// Decode every directive and assemble the response.
    ///
    /// The first decoding error aborts assembly; callers must treat it as a
    /// failed check, never as an allow.
    pub fn check_response(&self) -> Result<CheckResponse> {
        let allowed = self.is_allowed()?;

        // Only mapping decisions can carry metadata.
        let dynamic_metadata = match self.classify() {
            Decision::Mapping(_) => self.dynamic_metadata()?,
            _ => None,
        };

        let headers = self.response_header_value_options()?;
        let http_response = if allowed {
            HttpResponse::Ok(OkResponse {
                headers,
                headers_to_remove: self.request_headers_to_remove()?,
                response_headers_to_add: self.response_headers_to_add()?,
                query_parameters_to_set: self.query_parameters_to_set()?,
                query_parameters_to_remove: self.query_parameters_to_remove()?,
            })
        } else {
            HttpResponse::Denied(DeniedResponse {
                status: self.response_http_status()?,
                headers,
                body: self.response_body()?,
            })
        };

        tracing::debug!(decision_id = %self.decision_id(), allowed, "assembled check response");

        Ok(CheckResponse {
            decision_id: self.decision_id().to_string(),
            allowed,
            http_response,
            dynamic_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, StatusCode};
    use serde_json::json;

    #[test]
    fn boolean_allow() {
        let response = EvalResult::from_decision(json!(true)).check_response().unwrap();
        assert!(response.allowed);
        assert_eq!(response.http_response, HttpResponse::Ok(OkResponse::default()));
        assert_eq!(response.dynamic_metadata, None);
    }

    #[test]
    fn boolean_deny_uses_defaults() {
        let response = EvalResult::from_decision(json!(false)).check_response().unwrap();
        assert!(!response.allowed);
        let HttpResponse::Denied(denied) = response.http_response else {
            panic!("expected denied response");
        };
        assert_eq!(denied.status.code, StatusCode::Forbidden);
        assert!(denied.body.is_empty());
    }

    #[test]
    fn mapping_allow() {
        let result = EvalResult::from_decision(json!({
            "allowed": true,
            "headers": {"x-user": "alice"},
            "request_headers_to_remove": ["authorization"],
            "query_parameters_to_set": [{"key": "a", "value": "1"}],
            "dynamic_metadata": {"user": "alice"},
        }));
        let response = result.check_response().unwrap();
        let HttpResponse::Ok(ok) = &response.http_response else {
            panic!("expected ok response");
        };
        assert_eq!(ok.headers.len(), 1);
        assert_eq!(ok.headers_to_remove, vec!["authorization"]);
        assert_eq!(ok.query_parameters_to_set[0].key, "a");
        assert_eq!(
            response.dynamic_metadata.unwrap().get("user").and_then(|v| v.as_str()),
            Some("alice")
        );
    }

    #[test]
    fn mapping_deny() {
        let result = EvalResult::from_decision(json!({
            "allowed": false,
            "http_status": 401,
            "body": "unauthorized",
        }));
        let response = result.check_response().unwrap();
        assert_eq!(
            response.http_response,
            HttpResponse::Denied(DeniedResponse {
                status: HttpStatus {
                    code: StatusCode::Unauthorized
                },
                headers: vec![],
                body: "unauthorized".to_string(),
            })
        );
    }

    #[test]
    fn any_error_aborts() {
        let result = EvalResult::from_decision(json!({
            "allowed": true,
            "request_headers_to_remove": "authorization",
        }));
        assert!(matches!(result.check_response(), Err(Error::KeyType { .. })));

        let result = EvalResult::from_decision(json!({"allowed": false, "http_status": 9999}));
        assert!(matches!(result.check_response(), Err(Error::Range { .. })));
    }

    #[test]
    fn serializes_outcome() {
        let response = EvalResult::from_decision(json!(false)).check_response().unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["outcome"], "denied");
        assert_eq!(json["status"]["code"], 403);
    }
}
