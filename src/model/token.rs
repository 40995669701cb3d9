//! Credential and token data models
//!
//! Values here are immutable once issued: a refresh produces a new
//! [`OAuthToken`] that replaces the old one wholesale.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before literal expiry at which a short-lived token reports
/// itself invalid, so callers refresh ahead of time.
pub const PROACTIVE_REFRESH_WINDOW_SECS: i64 = 300;

/// Client credentials issued by the merchant portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Normalized result of a token endpoint request.
///
/// The endpoint responds with snake_case JSON, which matches the field
/// names here directly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticationResult {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

/// An OAuth access token with its computed expiry instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Build a stored token from an authentication result.
    ///
    /// `expires_at` is `now + max(0, expires_in)`: a negative or zero
    /// lifetime collapses to an already-expired token rather than erroring.
    pub fn from_result(result: &AuthenticationResult) -> Self {
        let expires_in = result.expires_in.max(0);
        Self {
            access_token: result.access_token.clone(),
            refresh_token: result.refresh_token.clone(),
            token_type: result.token_type.clone(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    /// Whether the access token is still usable.
    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

/// Secondary short-lived JWT, e.g. for a payment-terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortLivedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ShortLivedToken {
    /// Valid only while expiry is beyond the proactive refresh window.
    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now() + Duration::seconds(PROACTIVE_REFRESH_WINDOW_SECS)
    }
}
