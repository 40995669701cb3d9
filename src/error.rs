//! Error taxonomy for the SDK
//!
//! Three layers, matching the subsystems they belong to:
//! - [`StorageError`] - secure storage failures
//! - [`AuthenticationError`] - OAuth token endpoint failures
//! - [`ApiError`] - everything surfaced to business-endpoint callers
//!
//! Nothing in this crate is fatal; every failure path returns one of these.

use serde::Deserialize;

/// Errors raised by the secure credential store.
///
/// "Record does not exist" is never an error - loads return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to save to secure storage: {0}")]
    SaveFailed(#[source] std::io::Error),

    #[error("failed to read from secure storage: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("failed to delete from secure storage: {0}")]
    DeleteFailed(#[source] std::io::Error),

    #[error("failed to encode record for storage: {0}")]
    EncodeFailed(#[source] serde_json::Error),

    #[error("failed to decode stored record: {0}")]
    DecodeFailed(#[source] serde_json::Error),
}

/// Errors raised by [`crate::auth_client::AuthClient`] token requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    /// No client id/secret in session or storage.
    #[error("missing client credentials")]
    MissingClientCredentials,

    /// No refresh token in session or storage.
    #[error("missing refresh token")]
    MissingRefreshToken,

    /// Token endpoint returned 401.
    #[error("invalid client credentials")]
    InvalidCredentials,

    /// Transport-level failure or unexpected status.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Token endpoint returned 200 but the body did not decode.
    #[error("invalid response from token endpoint")]
    InvalidResponse,
}

/// Errors surfaced by the request pipeline to business-endpoint callers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("invalid response")]
    InvalidResponse,

    #[error("invalid client credentials")]
    InvalidCredentials,

    #[error("authentication required: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String, Option<ErrorInfo>),

    #[error("forbidden: {0}")]
    Forbidden(String, Option<ErrorInfo>),

    #[error("not found: {0}")]
    NotFound(String, Option<ErrorInfo>),

    #[error("server error: {0}")]
    ServerError(String, Option<ErrorInfo>),

    #[error("unknown error: {0}")]
    Unknown(String, Option<ErrorInfo>),
}

impl ApiError {
    /// Structured server error details, when the variant carries them.
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            ApiError::BadRequest(_, info)
            | ApiError::Forbidden(_, info)
            | ApiError::NotFound(_, info)
            | ApiError::ServerError(_, info)
            | ApiError::Unknown(_, info) => info.as_ref(),
            _ => None,
        }
    }

    /// Map an HTTP error status plus optional parsed body to the matching variant.
    ///
    /// 401 maps to `Unauthorized`: by the fixed interceptor ordering, any 401
    /// reaching classification has already been through the refresh-retry path.
    pub fn from_status(status: u16, info: Option<ErrorInfo>, default_message: Option<&str>) -> Self {
        let message = match &info {
            Some(info) => info.display_message(),
            None => default_message
                .map(str::to_string)
                .unwrap_or_else(|| format!("Server returned error status {status}")),
        };

        match status {
            400 => ApiError::BadRequest(message, info),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message, info),
            404 => ApiError::NotFound(message, info),
            500..=599 => ApiError::ServerError(message, info),
            _ => ApiError::Unknown(message, info),
        }
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthenticationError::NetworkError(message) => ApiError::NetworkError(message),
            AuthenticationError::InvalidResponse => ApiError::InvalidResponse,
            AuthenticationError::MissingClientCredentials
            | AuthenticationError::MissingRefreshToken => ApiError::Unauthorized(err.to_string()),
        }
    }
}

/// Structured information parsed from a server error body.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub details: Option<String>,
    pub status_code: i64,
    pub correlation_id: Option<String>,
    pub error_code: Option<String>,
    pub source: Option<String>,
    pub exception_type: Option<String>,
}

/// Wire form of a server error body.
///
/// Some backends return lowerCamelCase keys, others PascalCase; aliases
/// accept both.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "Details")]
    details: Option<String>,
    #[serde(default, rename = "statusCode", alias = "StatusCode")]
    status_code: Option<i64>,
    #[serde(default, rename = "correlationId", alias = "CorrelationId")]
    correlation_id: Option<String>,
    #[serde(default, rename = "errorCode", alias = "ErrorCode")]
    error_code: Option<String>,
    #[serde(default, alias = "Source")]
    source: Option<String>,
    #[serde(default, rename = "exceptionType", alias = "ExceptionType")]
    exception_type: Option<String>,
    /// Validation errors keyed by field: `{"field": ["message", ...]}`.
    #[serde(default, alias = "Errors")]
    errors: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ErrorInfo {
    /// Parse an error body, falling back to `http_status` when the body
    /// carries no status of its own.
    ///
    /// Returns `None` for empty or non-JSON-object bodies.
    pub fn from_body(body: &[u8], http_status: u16) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        let parsed: ErrorBody = serde_json::from_slice(body).ok()?;

        // Prefer explicit details; otherwise derive a message from the first
        // validation error entry.
        let details = parsed.details.filter(|s| !s.is_empty()).or_else(|| {
            let errors = parsed.errors.as_ref()?;
            let (_, messages) = errors.iter().next()?;
            messages
                .as_array()?
                .first()?
                .as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        Some(ErrorInfo {
            details,
            status_code: parsed.status_code.unwrap_or(i64::from(http_status)),
            correlation_id: parsed.correlation_id.filter(|s| !s.is_empty()),
            error_code: parsed.error_code.filter(|s| !s.is_empty()),
            source: parsed.source.filter(|s| !s.is_empty()),
            exception_type: parsed.exception_type.filter(|s| !s.is_empty()),
        })
    }

    /// Human-readable message: details (or exception type, or a generic
    /// status line) followed by correlation id and error code when present.
    pub fn display_message(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(details) = &self.details {
            parts.push(details.clone());
        } else if let Some(exception_type) = &self.exception_type {
            parts.push(exception_type.clone());
        } else {
            parts.push(format!("Server returned error status {}", self.status_code));
        }

        if let Some(correlation_id) = &self.correlation_id {
            parts.push(format!("(Correlation ID: {correlation_id})"));
        }
        if let Some(error_code) = &self.error_code {
            parts.push(format!("(Error Code: {error_code})"));
        }

        parts.join(" ")
    }
}
