//! Incoming response logging and body capture

use futures::future::BoxFuture;

use crate::error::ApiError;
use crate::middleware::{BodyBuffer, Interceptor, Next};
use crate::transport::{ApiRequest, ApiResponse};

/// Logs status and headers for every response and records the body into
/// the shared buffer, keyed by request id, for stages further up the chain.
/// The response itself is passed on untouched.
pub struct ResponseLogger {
    buffer: BodyBuffer,
}

impl ResponseLogger {
    pub fn new(buffer: BodyBuffer) -> Self {
        Self { buffer }
    }
}

impl Interceptor for ResponseLogger {
    fn handle<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            let request_id = request.request_id;
            let url = request.url.clone();
            let response = next(request).await?;

            tracing::info!(
                "<-- {} {} ({} header(s), body: {})",
                response.status,
                url,
                response.headers.len(),
                response
                    .body
                    .as_ref()
                    .map(|b| format!("{} bytes", b.len()))
                    .unwrap_or_else(|| "none".to_string())
            );
            self.buffer.record(request_id, response.body.clone());
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::InterceptorChain;
    use crate::middleware::test_support::ScriptedTransport;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_records_body_in_buffer() {
        let buffer = BodyBuffer::new();
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(
            ApiResponse::new(StatusCode::OK).with_body(Bytes::from_static(b"payload")),
        )]));
        let chain = InterceptorChain::new(
            vec![Arc::new(ResponseLogger::new(buffer.clone()))],
            transport,
        );

        let request = ApiRequest::get("https://api.example.com/x");
        let request_id = request.request_id;
        let response = chain.execute(request).await.unwrap();

        assert_eq!(response.body.unwrap().as_ref(), b"payload");
        assert_eq!(buffer.get(&request_id).unwrap().as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_records_marker_for_bodiless_response() {
        let buffer = BodyBuffer::new();
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(ApiResponse::new(
            StatusCode::NO_CONTENT,
        ))]));
        let chain = InterceptorChain::new(
            vec![Arc::new(ResponseLogger::new(buffer.clone()))],
            transport,
        );

        let request = ApiRequest::get("https://api.example.com/x");
        let request_id = request.request_id;
        chain.execute(request).await.unwrap();

        assert!(buffer.get(&request_id).is_none());
        assert_eq!(buffer.len(), 1);
    }
}
