//! Outgoing request logging

use futures::future::BoxFuture;
use http::HeaderMap;

use crate::error::ApiError;
use crate::middleware::{Interceptor, Next};
use crate::transport::{ApiRequest, ApiResponse};

/// Logs method, URL and headers for every outgoing request. The
/// Authorization header is masked to its prefix so logs never carry a full
/// bearer token.
pub struct RequestLogger;

const AUTH_MASK_PREFIX_LEN: usize = 20;

fn describe_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if name == &http::header::AUTHORIZATION {
                let raw = value.to_str().unwrap_or("<non-ascii>");
                let shown: String = raw.chars().take(AUTH_MASK_PREFIX_LEN).collect();
                format!("{name}: {shown}...")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("<non-ascii>"))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Interceptor for RequestLogger {
    fn handle<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            tracing::info!(
                "--> {} {} [{}]",
                request.method,
                request.url,
                describe_headers(&request.headers)
            );
            if let Some(body) = &request.body {
                tracing::debug!("--> body: {}", String::from_utf8_lossy(body));
            }
            next(request).await
        })
    }
}
