//! 401 refresh-retry protocol

use std::sync::Arc;

use futures::future::BoxFuture;
use http::{HeaderValue, StatusCode};

use crate::error::ApiError;
use crate::middleware::{Interceptor, Next};
use crate::transport::{ApiRequest, ApiResponse};

/// Closure that refreshes the session token and returns the new access
/// token. The client cache wires this to the token manager and empties its
/// cached-client slot before returning.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, Result<String, ApiError>> + Send + Sync>;

/// Retries a 401 response once after refreshing the token.
///
/// Only requests without a body are retried. The retry carries the same
/// request id and the fresh bearer, and its outcome is final: a second 401
/// passes through to the classifier. A failed refresh propagates the
/// original 401 with its body stripped, so the classifier raises a plain
/// `Unauthorized` rather than re-parsing a stale error payload.
pub struct TokenRefresher {
    refresh: RefreshFn,
}

impl TokenRefresher {
    pub fn new(refresh: RefreshFn) -> Self {
        Self { refresh }
    }
}

impl Interceptor for TokenRefresher {
    fn handle<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            let retry_template = if request.body.is_none() {
                Some(request.clone())
            } else {
                None
            };

            let response = next(request).await?;
            if response.status != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let Some(mut retry) = retry_template else {
                tracing::warn!("401 on a request with a body; not retryable");
                return Ok(response);
            };

            tracing::info!("received 401; refreshing token for a single retry");
            let access_token = match (self.refresh)().await {
                Ok(token) => token,
                Err(e) => {
                    tracing::error!("token refresh failed: {}", e);
                    let mut original = response;
                    original.body = None;
                    return Ok(original);
                }
            };

            let Ok(value) = HeaderValue::from_str(&format!("Bearer {access_token}")) else {
                tracing::error!("refreshed token is not a valid header value");
                let mut original = response;
                original.body = None;
                return Ok(original);
            };
            retry.headers.insert(http::header::AUTHORIZATION, value);
            tracing::info!("token refreshed; retrying request");
            next(retry).await
        })
    }
}
