//! Failure logging

use futures::future::BoxFuture;

use crate::error::ApiError;
use crate::middleware::{Interceptor, Next};
use crate::transport::{ApiRequest, ApiResponse};

/// Logs error statuses and pipeline errors, then rethrows unchanged.
///
/// Sits above ErrorClassifier, so classified errors pass through here with
/// their structured details already attached.
pub struct ErrorLogger;

impl Interceptor for ErrorLogger {
    fn handle<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            let method = request.method.clone();
            let url = request.url.clone();
            let result = next(request).await;

            match &result {
                Ok(response) if response.status.as_u16() >= 400 => {
                    tracing::error!("{} {} failed with status {}", method, url, response.status);
                }
                Ok(_) => {}
                Err(e) => match e.error_info() {
                    Some(info) => {
                        tracing::error!(
                            "{} {} failed: {} (status {}, correlation id {:?}, error code {:?})",
                            method,
                            url,
                            e,
                            info.status_code,
                            info.correlation_id,
                            info.error_code
                        );
                    }
                    None => {
                        tracing::error!("{} {} failed: {}", method, url, e);
                    }
                },
            }
            result
        })
    }
}
