//! Interceptor pipeline for business-API requests
//!
//! Requests pass through a fixed chain before reaching the transport;
//! responses unwind back through it in reverse. Each interceptor sees the
//! request on the way down and the response (or error) on the way up, so
//! the stage closest to the transport observes the raw response first.
//!
//! Request-phase order:
//! RequestLogger → AuthInjector → ErrorLogger → ErrorClassifier →
//! TokenRefresher → ResponseLogger → transport.
//!
//! The inversion matters: TokenRefresher sees a 401 before ErrorClassifier
//! turns it into an error, so the refresh-retry protocol runs first and the
//! classifier only ever sees 401s that already failed it.

pub mod auth_injector;
pub mod body_buffer;
pub mod error_classifier;
pub mod error_logger;
pub mod request_logger;
pub mod response_logger;
pub mod token_refresher;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::ApiError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub use auth_injector::AuthInjector;
pub use body_buffer::BodyBuffer;
pub use error_classifier::ErrorClassifier;
pub use error_logger::ErrorLogger;
pub use request_logger::RequestLogger;
pub use response_logger::ResponseLogger;
pub use token_refresher::{RefreshFn, TokenRefresher};

/// Continuation handed to an interceptor; calling it runs the rest of the
/// chain. TokenRefresher calls it twice on a retried request.
pub type Next<'a> = Box<dyn Fn(ApiRequest) -> BoxFuture<'a, Result<ApiResponse, ApiError>> + Send + Sync + 'a>;

/// One stage of the request pipeline.
pub trait Interceptor: Send + Sync {
    fn handle<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse, ApiError>>;
}

/// Fold the interceptor slice over the transport, head-first.
fn run<'a>(
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
    request: ApiRequest,
) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
    match interceptors.split_first() {
        Some((head, rest)) => {
            let next: Next<'a> = Box::new(move |req| run(rest, transport, req));
            head.handle(request, next)
        }
        None => transport.execute(request),
    }
}

/// An ordered interceptor chain bound to a transport.
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Arc<dyn Transport>,
}

impl InterceptorChain {
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            interceptors,
            transport,
        }
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        run(&self.interceptors, self.transport.as_ref(), request).await
    }
}

/// The standard chain, in the fixed order above, bound to the bearer token
/// and refresh closure the caller supplies.
pub fn default_chain(
    access_token: Option<String>,
    refresh: RefreshFn,
    buffer: BodyBuffer,
) -> Vec<Arc<dyn Interceptor>> {
    vec![
        Arc::new(RequestLogger),
        Arc::new(AuthInjector::new(access_token)),
        Arc::new(ErrorLogger),
        Arc::new(ErrorClassifier::new(buffer.clone())),
        Arc::new(TokenRefresher::new(refresh)),
        Arc::new(ResponseLogger::new(buffer)),
    ]
}
