//! SDK configuration
//!
//! One `Config` value is built at SDK initialization and shared (by clone)
//! with every component; there is no ambient global configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// SDK configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the OAuth authority, e.g. `https://oauth.example.com`.
    /// The token endpoint is `{authBaseUrl}/oauth2/token`.
    pub auth_base_url: String,

    /// Base URL of the business API, e.g. `https://api.example.com`.
    pub api_base_url: String,

    /// Directory holding the secure credential records.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Request timeout in seconds for both token and business requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// OAuth scope requested on both grant types.
    #[serde(default = "default_oauth_scope")]
    pub oauth_scope: String,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".payauth")
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_oauth_scope() -> String {
    "offline_access".to_string()
}

impl Config {
    /// Create a configuration with default storage dir, timeout and scope.
    pub fn new(auth_base_url: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            auth_base_url: auth_base_url.into(),
            api_base_url: api_base_url.into(),
            storage_dir: default_storage_dir(),
            request_timeout_secs: default_request_timeout_secs(),
            oauth_scope: default_oauth_scope(),
        }
    }

    /// Override the secure storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(std::io::Error::other)
    }

    /// Full token endpoint URL.
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/token", self.auth_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("https://oauth.example.com", "https://api.example.com");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.oauth_scope, "offline_access");
        assert_eq!(config.storage_dir, PathBuf::from(".payauth"));
    }

    #[test]
    fn test_token_endpoint_trims_trailing_slash() {
        let config = Config::new("https://oauth.example.com/", "https://api.example.com");
        assert_eq!(config.token_endpoint(), "https://oauth.example.com/oauth2/token");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "authBaseUrl": "https://oauth.example.com",
            "apiBaseUrl": "https://api.example.com"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.auth_base_url, "https://oauth.example.com");
        assert_eq!(config.oauth_scope, "offline_access");
    }

    #[test]
    fn test_deserialize_overrides() {
        let json = r#"{
            "authBaseUrl": "https://oauth.example.com",
            "apiBaseUrl": "https://api.example.com",
            "requestTimeoutSecs": 10,
            "oauthScope": "payments"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.oauth_scope, "payments");
    }
}
