//! Authenticated-request core of a payment platform SDK.
//!
//! Provides the OAuth 2.0 token lifecycle (client-credentials and
//! refresh-token grants), secure persistence of credentials and tokens, a
//! concurrency-safe session, and an interceptor pipeline for business API
//! requests that injects bearer tokens, classifies error responses and
//! transparently retries once after a token refresh.
//!
//! ```no_run
//! use payauth::context::SdkContext;
//! use payauth::model::config::Config;
//! use payauth::transport::ApiRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("https://oauth.example.com", "https://api.example.com");
//! let context = SdkContext::new(config)?;
//! context.authenticate("client-id", "client-secret").await?;
//!
//! let orders = context.client_cache()?;
//! let response = orders
//!     .execute(ApiRequest::get(orders.endpoint("/v1/orders/1")))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod auth_client;
pub mod client_cache;
pub mod context;
pub mod error;
pub mod http_client;
pub mod middleware;
pub mod model;
pub mod session;
pub mod store;
pub mod token_manager;
pub mod transport;

pub use client_cache::{ApiClient, ClientCache};
pub use context::SdkContext;
pub use error::{ApiError, AuthenticationError, ErrorInfo, StorageError};
pub use model::config::Config;
pub use model::token::{AuthenticationResult, Credentials, OAuthToken, ShortLivedToken};
pub use session::Session;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use token_manager::TokenManager;
pub use transport::{ApiRequest, ApiResponse, Transport};
