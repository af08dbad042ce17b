//! Error taxonomy shared by the product and invoice flows.
//!
//! Every failed operation surfaces as exactly one [`ApiError`]. The
//! [`Classifier`] is pure: it maps an HTTP status plus the raw response body
//! into a kind and a message, and never retries or logs on its own.
//! Transport failures that produced no response at all are mapped by the
//! HTTP layer via [`ApiError::connection_unavailable`].

use serde::Deserialize;
use thiserror::Error;

/// Closed set of failure kinds reported by the client core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response reached the service.
    ConnectionUnavailable,
    /// The referenced entity does not exist.
    NotFound,
    /// The request was rejected as malformed or insufficient, including
    /// insufficient stock detected authoritatively.
    ValidationFailed,
    /// Business-key collision, e.g. a duplicate product code.
    Conflict,
    /// The invoicing authority could not reach the inventory authority.
    /// A retry may succeed once the dependency recovers.
    DependencyUnavailable,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Fixed message used when the response body carries none.
    pub fn fallback_message(self) -> &'static str {
        match self {
            ErrorKind::ConnectionUnavailable => "could not reach the service",
            ErrorKind::NotFound => "the requested record was not found",
            ErrorKind::ValidationFailed => "the request was rejected as invalid",
            ErrorKind::Conflict => "a record with the same key already exists",
            ErrorKind::DependencyUnavailable => {
                "a downstream service is unavailable; retrying may succeed"
            }
            ErrorKind::Unknown => "an unknown error occurred",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ErrorKind::ConnectionUnavailable => "connection unavailable",
            ErrorKind::NotFound => "not found",
            ErrorKind::ValidationFailed => "validation failed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::DependencyUnavailable => "dependency unavailable",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A classified failure from either authority.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error with the kind's fallback message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.fallback_message())
    }

    /// No response reached the service at all.
    pub fn connection_unavailable() -> Self {
        Self::from_kind(ErrorKind::ConnectionUnavailable)
    }

    /// Whether retrying the identical request could plausibly succeed.
    ///
    /// `ValidationFailed` and `Conflict` mean the request itself must
    /// change; the transient kinds mean the environment must recover.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ConnectionUnavailable | ErrorKind::DependencyUnavailable
        )
    }
}

/// Error payload shape both authorities use: `{"error": …}`, with
/// `{"message": …}` as a secondary convention.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Pure mapping from HTTP statuses to the domain taxonomy.
///
/// The status treated as `DependencyUnavailable` is configurable: the 503
/// convention for "inventory authority unreachable during print" is not
/// part of any explicit authority contract.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    dependency_status: u16,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            dependency_status: 503,
        }
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `status` as `DependencyUnavailable` instead of 503.
    pub fn with_dependency_status(status: u16) -> Self {
        Self {
            dependency_status: status,
        }
    }

    /// Classify a non-2xx response.
    ///
    /// The message is taken from the body when it parses to a known error
    /// payload, otherwise the kind's fallback applies.
    pub fn classify(&self, status: u16, body: Option<&str>) -> ApiError {
        let kind = if status == self.dependency_status {
            ErrorKind::DependencyUnavailable
        } else {
            match status {
                400 => ErrorKind::ValidationFailed,
                404 => ErrorKind::NotFound,
                409 => ErrorKind::Conflict,
                _ => ErrorKind::Unknown,
            }
        };

        let message = body
            .and_then(|raw| serde_json::from_str::<ErrorBody>(raw).ok())
            .and_then(|body| body.error.or(body.message))
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| kind.fallback_message().to_string());

        ApiError::new(kind, message)
    }
}
