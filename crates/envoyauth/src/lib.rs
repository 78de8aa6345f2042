//! Decoding of policy decisions into Envoy external-authorization directives.
//!
//! A policy engine answers an authorization check with a loosely typed
//! JSON value: either a bare boolean, or an object carrying directive keys
//! such as `allowed`, `headers`, `http_status` or `dynamic_metadata`. This
//! crate turns that value into validated, strongly typed directives and
//! rejects anything it does not understand. An error is never an allow.
//!
//! # Overview
//!
//! - [`EvalResult`] wraps one decision with its decision ID and bundle
//!   revisions, and exposes one read-only decoder per directive.
//! - [`ResultConfig`] holds the request-scoped settings used to build it.
//! - [`EvalResult::check_response`] runs every decoder and assembles a
//!   [`CheckResponse`].
//!
//! # Accepted keys
//!
//! | Key | Shape | Default |
//! |---|---|---|
//! | `allowed` | boolean | required |
//! | `request_headers_to_remove` | list of strings | empty |
//! | `response_headers_to_add` | map of string or string list, or list of maps | empty |
//! | `headers` | same as `response_headers_to_add` | empty |
//! | `body` | string | empty |
//! | `http_status` | recognized status code | 403 |
//! | `dynamic_metadata` | object | none |
//! | `query_parameters_to_set` | list of `{key, value}` objects | empty |
//! | `query_parameters_to_remove` | list of strings | empty |
//!
//! A boolean decision means "no directives" for every key except
//! `dynamic_metadata`, which requires an object decision.
//!
//! # Example
//!
//! ```
//! use envoyauth::{EvalResult, ResultConfig, StatusCode};
//! use serde_json::json;
//!
//! let decision = json!({
//!     "allowed": false,
//!     "http_status": 401,
//!     "body": "login required",
//! });
//! let config = ResultConfig::default().with_decision_id("req-1");
//! let (result, timer) = EvalResult::new(decision, config)?;
//! let _ = timer.stop();
//!
//! assert!(!result.is_allowed()?);
//! assert_eq!(result.response_http_status()?.code, StatusCode::Unauthorized);
//! assert_eq!(result.response_body()?, "login required");
//! # Ok::<(), envoyauth::Error>(())
//! ```

mod decision;
mod error;
mod headers;
mod metadata;
mod query;
mod response;
mod result;
mod status;

pub use error::{Error, Result};
pub use headers::{HeaderEntry, HeaderValue, HeaderValueOption};
pub use metadata::{MAX_METADATA_DEPTH, Struct, StructValue};
pub use query::QueryParameter;
pub use response::{CheckResponse, DeniedResponse, HttpResponse, OkResponse};
pub use result::{EvalResult, EvalTimer, ResultConfig};
pub use status::{HttpStatus, StatusCode};
