//! Error status classification

use futures::future::BoxFuture;

use crate::error::{ApiError, ErrorInfo};
use crate::middleware::{BodyBuffer, Interceptor, Next};
use crate::transport::{ApiRequest, ApiResponse};

/// Turns error statuses into typed [`ApiError`]s.
///
/// Reads the response body directly, falling back to the shared buffer
/// entry recorded closer to the transport. A 401 reaching this stage has
/// already been through TokenRefresher, so it always classifies as
/// `Unauthorized`. The buffer entry for the request is cleared at every
/// terminal state.
pub struct ErrorClassifier {
    buffer: BodyBuffer,
}

impl ErrorClassifier {
    pub fn new(buffer: BodyBuffer) -> Self {
        Self { buffer }
    }
}

impl Interceptor for ErrorClassifier {
    fn handle<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            let request_id = request.request_id;
            let result = next(request).await;

            let classified = match result {
                Err(e) => Err(e),
                Ok(response) if response.status.as_u16() < 400 => Ok(response),
                Ok(response) => {
                    let status = response.status.as_u16();
                    let body = response
                        .body
                        .clone()
                        .or_else(|| self.buffer.get(&request_id));
                    let info = body.as_deref().and_then(|b| ErrorInfo::from_body(b, status));
                    if info.is_none() {
                        if let Some(body) = &body {
                            tracing::debug!(
                                "unparseable error body for status {}: {}",
                                status,
                                String::from_utf8_lossy(body)
                            );
                        }
                    }
                    Err(ApiError::from_status(status, info, None))
                }
            };

            self.buffer.clear(&request_id);
            classified
        })
    }
}
