//! Client error types

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Closed classification of conversion failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401 — missing or invalid API key
    Unauthorized,
    /// 403 — key is valid but not allowed to convert
    Forbidden,
    /// 404 — endpoint or resource not found
    NotFound,
    /// 429 — too many requests
    RateLimited,
    /// 413 — upload exceeds the plan's size quota
    QuotaExceeded,
    /// Rejected before or by the server as malformed (validation, other 4xx)
    InvalidRequest,
    /// 5xx server-side failure
    ServerError,
    /// Transport-level failure (DNS, connect, TLS, broken body)
    NetworkError,
    /// Timed out or cancelled before a response arrived
    Timeout,
    /// Anything that fits no other bucket
    Unknown,
}

impl ErrorKind {
    /// Maps an HTTP status code to an error kind.
    ///
    /// The 413 → `QuotaExceeded` entry mirrors the current backend behavior
    /// and is provisional; callers that need to distinguish can re-map on
    /// the preserved status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            413 => Self::QuotaExceeded,
            429 => Self::RateLimited,
            status if (400..500).contains(&status) => Self::InvalidRequest,
            status if (500..600).contains(&status) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::ServerError => "SERVER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Structured conversion failure.
///
/// Every failure path produces exactly one of these; `kind` and `message`
/// are always populated, the rest depends on how far the request got.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    /// Failure classification
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// HTTP status code, when a response was received
    pub status: Option<u16>,
    /// Correlation id from the server, for support requests
    pub request_id: Option<String>,
    /// Opaque diagnostic payload (parsed server error body, or a short
    /// transport failure classification)
    pub details: Option<Value>,
}

impl ClientError {
    /// Creates an error with just a kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            request_id: None,
            details: None,
        }
    }

    /// Creates a validation error (never retried).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Creates a timeout/cancellation error.
    pub(crate) fn timed_out() -> Self {
        Self::new(ErrorKind::Timeout, "Request timed out")
    }

    /// Builds an error from a non-2xx response.
    ///
    /// The message comes from the body's `message` field, then
    /// `error_description`, then a generic fallback. The parsed body (if
    /// any) is kept verbatim as the diagnostic payload.
    pub(crate) fn from_response(status: u16, request_id: Option<String>, body: Option<Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| {
                b.get("message")
                    .and_then(Value::as_str)
                    .or_else(|| b.get("error_description").and_then(Value::as_str))
            })
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {status}"));

        Self {
            kind: ErrorKind::from_status(status),
            message,
            status: Some(status),
            request_id,
            details: body,
        }
    }

    /// Builds an error from a transport-level failure. Aborts and timeouts
    /// become `Timeout`; everything else is `NetworkError` with a short
    /// classification of the cause preserved in the diagnostic payload.
    pub(crate) fn from_transport(source: &reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timed_out();
        }

        let cause = if source.is_connect() {
            "connect"
        } else if source.is_body() {
            "body"
        } else if source.is_decode() {
            "decode"
        } else if source.is_request() {
            "request"
        } else {
            "unknown"
        };

        Self {
            kind: ErrorKind::NetworkError,
            message: source.to_string(),
            status: None,
            request_id: None,
            details: Some(serde_json::json!({ "cause": cause })),
        }
    }

    /// Whether a retry could plausibly succeed: transport failures,
    /// timeouts, and 408/429/5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Timeout | ErrorKind::NetworkError => true,
            _ => matches!(self.status, Some(408) | Some(429) | Some(500..=599)),
        }
    }
}
