// src/error.rs
//! Application error types with structured error handling.
//!
//! Each variant names a failure mode of the table client: the transport
//! failed, the service refused, or a record did not fit the tabular schema.
//! `is_retryable` is the single place deciding which of them the resilience
//! wrapper retries with a fresh identity.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The `code` field of a Notion error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// Too many requests for the integration.
    RateLimited,
    ObjectNotFound,
    /// Token rejected.
    Unauthorized,
    /// Token valid but not shared with the resource.
    RestrictedResource,
    InvalidJson,
    /// A property payload or query body was refused.
    ValidationFailed,
    Conflict,
    InternalError,
    ServiceUnavailable,
    /// No parseable body; only the status is known.
    HttpStatus(u16),
    Unknown(String),
}

impl NotionErrorCode {
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Classifies an error response, preferring the JSON `code` field over
    /// the bare HTTP status.
    pub fn from_response(status: u16, body: &str) -> Self {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(Self::from_api_response))
            .unwrap_or(Self::HttpStatus(status))
    }

    /// Transient codes: throttling and server-side failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::ServiceUnavailable | Self::InternalError => true,
            Self::HttpStatus(status) => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Everything that can go wrong between a table call and the service.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API request to {url} failed ({status}, {code}): {body}")]
    Transport {
        status: u16,
        code: NotionErrorCode,
        body: String,
        url: String,
    },

    #[error("Request to {endpoint} did not complete within {after:?}")]
    Timeout { endpoint: String, after: Duration },

    #[error("Unsupported {context} kind '{kind}'")]
    UnsupportedKind { kind: String, context: String },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{column}' was inferred as {existing} but a record declares it as {found}")]
    ColumnKindConflict {
        column: String,
        existing: String,
        found: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid query pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Builds a transport error from a non-success response.
    pub fn transport(status: u16, body: impl Into<String>, url: impl Into<String>) -> Self {
        let body = body.into();
        AppError::Transport {
            status,
            code: NotionErrorCode::from_response(status, &body),
            body,
            url: url.into(),
        }
    }

    /// Whether the resilience wrapper should rotate identity and try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkFailure(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::Timeout { .. } => true,
            AppError::Transport { status, code, .. } => {
                code.is_retryable() || NotionErrorCode::HttpStatus(*status).is_retryable()
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}
