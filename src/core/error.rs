use std::time::Duration;

use thiserror::Error;

/// Vendor status codes reporting an invalid signature or an out-of-window
/// timestamp. The dispatcher resyncs the clock once when it sees one of these.
pub const SIGNATURE_ERROR_CODES: [i64; 3] = [2, 3, 15];

/// Errors surfaced by every layer of the SDK.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AmegoError {
    /// Configuration or request data failed local checks. Never sent.
    #[error("{message}: {}", join_violations(.errors))]
    Validation {
        message: String,
        errors: Vec<ValidationError>,
    },

    /// The API accepted the request but answered with a non-zero `code`.
    #[error("API error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        /// Full decoded response body.
        response: serde_json::Value,
    },

    /// Connection refused, DNS failure, reset, or a non-2xx HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The configured request deadline elapsed.
    #[error("request timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// The local rate limiter refused admission.
    #[error("rate limit exceeded, retry after {}ms", .retry_after.as_millis())]
    RateLimitExceeded { retry_after: Duration },

    /// The response body could not be decoded or lacked required data.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Coarse classification of [`AmegoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Api,
    Network,
    Timeout,
    RateLimitExceeded,
    InvalidResponse,
}

impl AmegoError {
    /// Build a validation error from a list of violations.
    pub fn validation(message: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Api { .. } => ErrorKind::Api,
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }

    /// Vendor code of an [`AmegoError::Api`] error.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for API errors caused by a bad signature or a skewed timestamp.
    pub fn is_signature_error(&self) -> bool {
        self.api_code()
            .is_some_and(|code| SIGNATURE_ERROR_CODES.contains(&code))
    }

    /// Individual violations of a validation error; empty for other kinds.
    pub fn violations(&self) -> &[ValidationError] {
        match self {
            Self::Validation { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// A single validation failure with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the invalid field (e.g. "ProductItem[0].Description").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefix the field path, e.g. `ProductItem[2]` + `Description`.
    pub fn nested(self, parent: &str) -> Self {
        let field = if self.field.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.field)
        };
        Self { field, ..self }
    }
}

fn join_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
