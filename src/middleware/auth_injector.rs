//! Bearer token injection

use futures::future::BoxFuture;
use http::HeaderValue;

use crate::error::ApiError;
use crate::middleware::{Interceptor, Next};
use crate::transport::{ApiRequest, ApiResponse};

/// Sets `Authorization: Bearer <token>` on every request.
///
/// Bound to one token at chain-build time; the client cache rebuilds the
/// chain when the session's token changes. No header is set for an absent
/// or empty token, so unauthenticated requests go out bare and fail with a
/// server-side 401 rather than a malformed header.
pub struct AuthInjector {
    access_token: Option<String>,
}

impl AuthInjector {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            access_token: access_token.filter(|t| !t.is_empty()),
        }
    }
}

impl Interceptor for AuthInjector {
    fn handle<'a>(
        &'a self,
        mut request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            if let Some(token) = &self.access_token {
                match HeaderValue::from_str(&format!("Bearer {token}")) {
                    Ok(value) => {
                        request.headers.insert(http::header::AUTHORIZATION, value);
                    }
                    Err(_) => {
                        tracing::warn!("access token is not a valid header value; sending without Authorization");
                    }
                }
            }
            next(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::InterceptorChain;
    use crate::middleware::test_support::ScriptedTransport;
    use http::StatusCode;
    use std::sync::Arc;

    async fn sent_authorization(token: Option<&str>) -> Option<String> {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(ApiResponse::new(
            StatusCode::OK,
        ))]));
        let chain = InterceptorChain::new(
            vec![Arc::new(AuthInjector::new(token.map(str::to_string)))],
            transport.clone(),
        );
        chain
            .execute(ApiRequest::get("https://api.example.com/x"))
            .await
            .unwrap();
        let requests = transport.requests.lock();
        requests[0]
            .headers
            .get(http::header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_injects_bearer_header() {
        assert_eq!(
            sent_authorization(Some("tok")).await,
            Some("Bearer tok".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        assert_eq!(sent_authorization(None).await, None);
    }

    #[tokio::test]
    async fn test_no_header_for_empty_token() {
        assert_eq!(sent_authorization(Some("")).await, None);
    }
}
