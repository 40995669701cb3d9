//! OAuth token endpoint client
//!
//! Executes the two grant types against `{auth_base_url}/oauth2/token` and
//! returns a normalized [`AuthenticationResult`]. Persisting the result is
//! the caller's job (see [`crate::token_manager::TokenManager`]).

use std::sync::Arc;

use crate::error::AuthenticationError;
use crate::http_client::build_client;
use crate::model::config::Config;
use crate::model::token::AuthenticationResult;
use crate::session::Session;
use crate::store::CredentialStore;

pub struct AuthClient {
    config: Config,
    session: Arc<Session>,
    store: Arc<dyn CredentialStore>,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(
        config: Config,
        session: Arc<Session>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, AuthenticationError> {
        let client = build_client(config.request_timeout_secs)
            .map_err(|e| AuthenticationError::NetworkError(e.to_string()))?;
        Ok(Self {
            config,
            session,
            store,
            client,
        })
    }

    /// OAuth 2.0 client-credentials grant.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        tracing::info!("starting client-credentials authentication");
        self.perform_token_request(
            &[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", &self.config.oauth_scope),
            ],
            "[auth]",
        )
        .await
    }

    /// Refresh-token grant.
    ///
    /// Client id/secret and the refresh token are read from the session
    /// first, falling back to the credential store for each.
    pub async fn refresh_token(&self) -> Result<AuthenticationResult, AuthenticationError> {
        tracing::info!("starting token refresh");

        let credentials = self
            .session
            .get_credentials()
            .or_else(|| self.store.load_credentials().ok().flatten());
        let refresh_token = self
            .session
            .get_token()
            .and_then(|token| token.refresh_token)
            .or_else(|| {
                self.store
                    .load_token()
                    .ok()
                    .flatten()
                    .and_then(|token| token.refresh_token)
            });

        let Some(credentials) = credentials else {
            tracing::error!("missing client credentials for refresh");
            return Err(AuthenticationError::MissingClientCredentials);
        };
        let Some(refresh_token) = refresh_token else {
            tracing::error!("missing refresh token for refresh");
            return Err(AuthenticationError::MissingRefreshToken);
        };

        self.perform_token_request(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", &refresh_token),
                ("client_id", &credentials.client_id),
                ("client_secret", &credentials.client_secret),
                ("scope", &self.config.oauth_scope),
            ],
            "[refresh]",
        )
        .await
    }

    /// Shared token request: form-encoded POST, outcome mapped to the
    /// authentication error taxonomy.
    async fn perform_token_request(
        &self,
        params: &[(&str, &str)],
        log_tag: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let url = self.config.token_endpoint();

        // The form body carries secrets; only log it in debug builds.
        if cfg!(debug_assertions) {
            tracing::debug!("POST {} {:?} {}", url, params, log_tag);
        } else {
            tracing::debug!("POST {} [request body redacted] {}", url, log_tag);
        }

        let response = self
            .client
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        tracing::info!("token endpoint response: {} {}", status.as_u16(), log_tag);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::error!("token request failed: invalid credentials (401) {}", log_tag);
            return Err(AuthenticationError::InvalidCredentials);
        }
        if !status.is_success() {
            if let Ok(body) = response.text().await {
                tracing::debug!("token endpoint body: {}", body);
            }
            tracing::error!("token request failed: HTTP {} {}", status.as_u16(), log_tag);
            return Err(AuthenticationError::NetworkError(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let body = response.bytes().await.map_err(map_transport_error)?;
        match serde_json::from_slice::<AuthenticationResult>(&body) {
            Ok(result) => {
                tracing::debug!(
                    "token type: {}, expires in: {}s {}",
                    result.token_type,
                    result.expires_in,
                    log_tag
                );
                Ok(result)
            }
            Err(e) => {
                // Response body is logged only on decode failure, for diagnosis.
                tracing::debug!("token endpoint body: {}", String::from_utf8_lossy(&body));
                tracing::error!("failed to decode token response: {} {}", e, log_tag);
                Err(AuthenticationError::InvalidResponse)
            }
        }
    }
}

/// Map transport-level failures to human-readable network errors.
fn map_transport_error(e: reqwest::Error) -> AuthenticationError {
    let message = if e.is_timeout() {
        "Request timed out".to_string()
    } else if e.is_connect() {
        "Cannot connect to server".to_string()
    } else {
        e.to_string()
    };
    tracing::error!("network error: {}", message);
    AuthenticationError::NetworkError(message)
}
