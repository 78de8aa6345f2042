//! HTTP status override.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decision::{Decision, HTTP_STATUS, type_name};
use crate::{Error, Result};

macro_rules! status_codes {
    ($($name:ident = $code:literal),+ $(,)?) => {
        /// Status codes recognized by Envoy's `type.v3.StatusCode`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u16", try_from = "u16")]
        #[repr(u16)]
        #[allow(clippy::upper_case_acronyms)]
        pub enum StatusCode {
            $($name = $code,)+
        }

        impl StatusCode {
            /// All recognized codes, in ascending order.
            pub const ALL: &'static [StatusCode] = &[$(StatusCode::$name,)+];

            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(Self::$name),)+
                    _ => None,
                }
            }

            /// The enum value name, e.g. `"Forbidden"`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)+
                }
            }
        }
    };
}

status_codes! {
    Continue = 100,
    OK = 200,
    Created = 201,
    Accepted = 202,
    NonAuthoritativeInformation = 203,
    NoContent = 204,
    ResetContent = 205,
    PartialContent = 206,
    MultiStatus = 207,
    AlreadyReported = 208,
    IMUsed = 226,
    MultipleChoices = 300,
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    UseProxy = 305,
    TemporaryRedirect = 307,
    PermanentRedirect = 308,
    BadRequest = 400,
    Unauthorized = 401,
    PaymentRequired = 402,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    ProxyAuthenticationRequired = 407,
    RequestTimeout = 408,
    Conflict = 409,
    Gone = 410,
    LengthRequired = 411,
    PreconditionFailed = 412,
    PayloadTooLarge = 413,
    URITooLong = 414,
    UnsupportedMediaType = 415,
    RangeNotSatisfiable = 416,
    ExpectationFailed = 417,
    MisdirectedRequest = 421,
    UnprocessableEntity = 422,
    Locked = 423,
    FailedDependency = 424,
    UpgradeRequired = 426,
    PreconditionRequired = 428,
    TooManyRequests = 429,
    RequestHeaderFieldsTooLarge = 431,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
    HTTPVersionNotSupported = 505,
    VariantAlsoNegotiates = 506,
    InsufficientStorage = 507,
    LoopDetected = 508,
    NotExtended = 510,
    NetworkAuthenticationRequired = 511,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::Forbidden
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.name())
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = String;

    fn try_from(code: u16) -> std::result::Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unrecognized HTTP status code {code}"))
    }
}

/// Envoy `type.v3.HttpStatus`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpStatus {
    pub code: StatusCode,
}

/// Decode `http_status`, defaulting to 403.
pub(crate) fn http_status(decision: &Decision<'_>) -> Result<HttpStatus> {
    let Some(value) = decision.field(HTTP_STATUS)? else {
        return Ok(HttpStatus::default());
    };
    let Value::Number(number) = value else {
        return Err(Error::KeyType {
            key: HTTP_STATUS,
            expected: "number",
            found: type_name(value),
        });
    };

    let code = number
        .as_u64()
        .and_then(|n| u16::try_from(n).ok())
        .and_then(StatusCode::from_code)
        .ok_or_else(|| Error::Range {
            key: HTTP_STATUS,
            value: number.to_string(),
        })?;

    Ok(HttpStatus { code })
}
