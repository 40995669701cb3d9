//! Request/response types and the transport seam
//!
//! The interceptor pipeline operates on [`ApiRequest`]/[`ApiResponse`]
//! rather than on reqwest types, so interceptors can be unit-tested against
//! scripted transports.

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use uuid::Uuid;

use crate::error::ApiError;

/// A request flowing through the interceptor pipeline.
///
/// `request_id` identifies one logical operation across retries; the
/// response-body buffer is keyed by it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub request_id: Uuid,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Attach a JSON body and matching content type.
    pub fn with_json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_vec(value).map_err(|_| ApiError::InvalidResponse)?;
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(Bytes::from(body));
        Ok(self)
    }

    pub fn with_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ApiResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The terminal stage of the pipeline: puts a request on the wire.
pub trait Transport: Send + Sync {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>>;
}

/// Production transport over a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method, &request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(map_transport_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(map_transport_error)?;

            Ok(ApiResponse {
                status,
                headers,
                body: if body.is_empty() { None } else { Some(body) },
            })
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> ApiError {
    let message = if e.is_timeout() {
        "Request timed out".to_string()
    } else if e.is_connect() {
        "Cannot connect to server".to_string()
    } else if e.is_builder() || e.is_request() {
        format!("Invalid request: {e}")
    } else {
        e.to_string()
    };
    tracing::error!("transport error: {}", message);
    ApiError::NetworkError(message)
}
