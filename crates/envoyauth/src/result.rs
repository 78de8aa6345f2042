//! The evaluation result facade.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::decision::{
    self, ALLOWED, BODY, Decision, HEADERS, QUERY_PARAMETERS_TO_REMOVE,
    REQUEST_HEADERS_TO_REMOVE, RESPONSE_HEADERS_TO_ADD, type_name,
};
use crate::headers::{self, HeaderEntry, HeaderValueOption};
use crate::metadata::{self, Struct};
use crate::query::{self, QueryParameter};
use crate::status::{self, HttpStatus};
use crate::{Error, Result};

/// Request-scoped settings applied when building an [`EvalResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultConfig {
    /// Decision ID to report. Generated when unset.
    #[serde(default)]
    pub decision_id: Option<String>,

    /// Storage transaction the decision was evaluated in.
    #[serde(default)]
    pub txn_id: Option<u64>,

    /// Revision of the single (legacy) bundle.
    #[serde(default)]
    pub revision: Option<String>,

    /// Revisions keyed by bundle name.
    #[serde(default)]
    pub revisions: BTreeMap<String, String>,
}

impl ResultConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }

    pub fn with_decision_id(mut self, decision_id: impl Into<String>) -> Self {
        self.decision_id = Some(decision_id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self
            .decision_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(Error::InvalidConfig("decision_id must not be blank".into()));
        }
        if self.revision.is_some() && !self.revisions.is_empty() {
            return Err(Error::AmbiguousRevision);
        }
        if let Some(bundle) = self.revisions.keys().find(|name| name.is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "revisions contains an unnamed bundle ({bundle:?})"
            )));
        }
        Ok(())
    }
}

/// Measures how long the evaluator took to produce a decision.
///
/// Handed back by [`EvalResult::new`]; the decoders never look at it.
#[derive(Debug)]
#[must_use = "stop the timer once evaluation completes"]
pub struct EvalTimer {
    decision_id: String,
    started: Instant,
}

impl EvalTimer {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop the timer and return the evaluation time.
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::trace!(decision_id = %self.decision_id, ?elapsed, "policy evaluation finished");
        elapsed
    }
}

/// A policy decision together with its request-scoped identifiers.
///
/// Every decoding method is a pure read of the decision; decoding the same
/// result twice gives the same answer.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    decision_id: String,
    txn_id: Option<u64>,
    revision: Option<String>,
    revisions: BTreeMap<String, String>,
    decision: Value,
}

impl EvalResult {
    /// Build a result from a decision and validated configuration.
    pub fn new(decision: Value, config: ResultConfig) -> Result<(Self, EvalTimer)> {
        config.validate()?;

        let decision_id = config
            .decision_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let timer = EvalTimer {
            decision_id: decision_id.clone(),
            started: Instant::now(),
        };

        let result = Self {
            decision_id,
            txn_id: config.txn_id,
            revision: config.revision,
            revisions: config.revisions,
            decision,
        };
        Ok((result, timer))
    }

    /// Build a result with default configuration.
    pub fn from_decision(decision: Value) -> Self {
        Self {
            decision_id: Uuid::new_v4().to_string(),
            txn_id: None,
            revision: None,
            revisions: BTreeMap::new(),
            decision,
        }
    }

    pub fn decision_id(&self) -> &str {
        &self.decision_id
    }

    pub fn txn_id(&self) -> Option<u64> {
        self.txn_id
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn revisions(&self) -> &BTreeMap<String, String> {
        &self.revisions
    }

    pub fn decision(&self) -> &Value {
        &self.decision
    }

    pub(crate) fn classify(&self) -> Decision<'_> {
        Decision::classify(&self.decision)
    }

    /// Whether the request is allowed.
    ///
    /// A boolean decision is the answer itself; a mapping must carry a
    /// boolean `allowed` key.
    pub fn is_allowed(&self) -> Result<bool> {
        let allowed = match self.classify() {
            Decision::Boolean(allowed) => Ok(allowed),
            Decision::Mapping(map) => match map.get(ALLOWED) {
                None => Err(Error::MissingAllowed),
                Some(Value::Bool(allowed)) => Ok(*allowed),
                Some(other) => Err(Error::KeyType {
                    key: ALLOWED,
                    expected: "boolean",
                    found: type_name(other),
                }),
            },
            Decision::Invalid(value) => Err(decision::shape_error(value)),
        };
        self.traced(ALLOWED, allowed)
    }

    /// Header names to strip from the upstream request.
    pub fn request_headers_to_remove(&self) -> Result<Vec<String>> {
        let names = headers::string_list(&self.classify(), REQUEST_HEADERS_TO_REMOVE);
        self.traced(REQUEST_HEADERS_TO_REMOVE, names)
    }

    /// Headers to add to the downstream response.
    pub fn response_headers_to_add(&self) -> Result<Vec<HeaderEntry>> {
        let entries = headers::header_entries(&self.classify(), RESPONSE_HEADERS_TO_ADD);
        self.traced(RESPONSE_HEADERS_TO_ADD, entries)
    }

    /// Headers from the `headers` key as Envoy header value options.
    pub fn response_header_value_options(&self) -> Result<Vec<HeaderValueOption>> {
        let options = headers::header_entries(&self.classify(), HEADERS)
            .map(|entries| entries.into_iter().map(HeaderValueOption::from).collect());
        self.traced(HEADERS, options)
    }

    /// Query parameters to set on the upstream request, in order.
    pub fn query_parameters_to_set(&self) -> Result<Vec<QueryParameter>> {
        let params = query::parameters_to_set(&self.classify());
        self.traced(decision::QUERY_PARAMETERS_TO_SET, params)
    }

    /// Query parameter names to strip from the upstream request.
    pub fn query_parameters_to_remove(&self) -> Result<Vec<String>> {
        let names = headers::string_list(&self.classify(), QUERY_PARAMETERS_TO_REMOVE);
        self.traced(QUERY_PARAMETERS_TO_REMOVE, names)
    }

    /// Body for a denied response; empty when unset.
    pub fn response_body(&self) -> Result<String> {
        let body = self.classify().field(BODY).and_then(|value| match value {
            None => Ok(String::new()),
            Some(Value::String(body)) => Ok(body.clone()),
            Some(other) => Err(Error::KeyType {
                key: BODY,
                expected: "string",
                found: type_name(other),
            }),
        });
        self.traced(BODY, body)
    }

    /// Status for a denied response; 403 when unset.
    pub fn response_http_status(&self) -> Result<HttpStatus> {
        let status = status::http_status(&self.classify());
        self.traced(decision::HTTP_STATUS, status)
    }

    /// Dynamic metadata for downstream filters. A boolean decision is an error.
    pub fn dynamic_metadata(&self) -> Result<Option<Struct>> {
        let metadata = metadata::dynamic_metadata(&self.classify());
        self.traced(decision::DYNAMIC_METADATA, metadata)
    }

    fn traced<T>(&self, key: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::debug!(decision_id = %self.decision_id, key, error = %e, "rejected decision");
        }
        result
    }
}
