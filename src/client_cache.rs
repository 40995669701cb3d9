//! Token-bound API client cache
//!
//! An [`ApiClient`] is an interceptor chain bound to one bearer token. The
//! cache hands out a shared client while the session's token is unchanged
//! and rebuilds it when the token rotates. The refresh closure wired into
//! the chain empties the cache slot synchronously, so any `get_client()`
//! ordered after a refresh observes the empty slot and rebuilds.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http_client::build_client;
use crate::middleware::{BodyBuffer, InterceptorChain, RefreshFn, default_chain};
use crate::model::config::Config;
use crate::session::Session;
use crate::token_manager::TokenManager;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// A ready-to-use client for business endpoints.
pub struct ApiClient {
    chain: InterceptorChain,
}

impl ApiClient {
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.chain.execute(request).await
    }

    /// Execute and decode a JSON response body.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let Some(body) = response.body else {
            tracing::error!("expected a JSON body, got an empty response");
            return Err(ApiError::InvalidResponse);
        };
        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("failed to decode response body: {}", e);
            ApiError::InvalidResponse
        })
    }
}

struct CachedClient {
    access_token: Option<String>,
    client: Arc<ApiClient>,
}

/// Cache of the current [`ApiClient`], keyed by the session's access token.
pub struct ClientCache {
    config: Config,
    session: Arc<Session>,
    token_manager: Arc<TokenManager>,
    http: reqwest::Client,
    slot: Arc<Mutex<Option<CachedClient>>>,
}

impl ClientCache {
    pub fn new(
        config: Config,
        session: Arc<Session>,
        token_manager: Arc<TokenManager>,
    ) -> Result<Self, ApiError> {
        let http = build_client(config.request_timeout_secs)
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;
        Ok(Self {
            config,
            session,
            token_manager,
            http,
            slot: Arc::new(Mutex::new(None)),
        })
    }

    /// Absolute URL for a path under the configured API base.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Client bound to the session's current valid token, rebuilt only when
    /// the token has changed since the last call.
    pub fn get_client(&self) -> Result<Arc<ApiClient>, ApiError> {
        let mut slot = self.slot.lock();
        // Token read happens under the slot lock, so the cached entry always
        // matches a token observed after any refresh that emptied the slot.
        let access_token = self.session.get_valid_access_token();

        if let Some(cached) = slot.as_ref() {
            if cached.access_token == access_token {
                return Ok(cached.client.clone());
            }
            tracing::debug!("access token changed; rebuilding api client");
        }

        let client = Arc::new(self.build_api_client(access_token.clone())?);
        *slot = Some(CachedClient {
            access_token,
            client: client.clone(),
        });
        Ok(client)
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.get_client()?.execute(request).await
    }

    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.get_client()?.execute_json(request).await
    }

    fn build_api_client(&self, access_token: Option<String>) -> Result<ApiClient, ApiError> {
        // Catch a bad base URL here, where it is recoverable, instead of on
        // every request.
        reqwest::Url::parse(&self.config.api_base_url)
            .map_err(|e| ApiError::NetworkError(format!("Invalid API base URL: {e}")))?;

        let token_manager = self.token_manager.clone();
        let slot = self.slot.clone();
        let stale = access_token.clone();
        let refresh: RefreshFn = Arc::new(move || {
            let token_manager = token_manager.clone();
            let slot = slot.clone();
            let stale = stale.clone();
            Box::pin(async move {
                let token = token_manager
                    .refresh_for_retry(stale)
                    .await
                    .map_err(ApiError::from)?;
                // Invalidate before handing the new token back, so the slot
                // is already empty when the retried request completes.
                *slot.lock() = None;
                Ok(token.access_token)
            })
        });

        let transport = Arc::new(HttpTransport::new(self.http.clone()));
        let chain = InterceptorChain::new(
            default_chain(access_token, refresh, BodyBuffer::new()),
            transport,
        );
        Ok(ApiClient { chain })
    }
}
