//! SDK context
//!
//! Explicit wiring for one SDK instance: configuration, secure storage,
//! session and token lifecycle. There is no global state; an application
//! holds the context and hands out client caches from it. Two contexts
//! sharing a storage directory share persisted credentials but nothing
//! in memory.

use std::sync::Arc;

use crate::error::{ApiError, AuthenticationError};
use crate::client_cache::ClientCache;
use crate::model::config::Config;
use crate::model::token::OAuthToken;
use crate::session::Session;
use crate::store::{CredentialStore, FileCredentialStore};
use crate::token_manager::TokenManager;

pub struct SdkContext {
    config: Config,
    store: Arc<dyn CredentialStore>,
    session: Arc<Session>,
    token_manager: Arc<TokenManager>,
}

impl SdkContext {
    /// Build a context with file-backed secure storage under
    /// `config.storage_dir`.
    pub fn new(config: Config) -> Result<Self, AuthenticationError> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(&config.storage_dir));
        Self::with_store(config, store)
    }

    /// Build a context over a caller-supplied credential store.
    pub fn with_store(
        config: Config,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, AuthenticationError> {
        let session = Arc::new(Session::new(store.clone()));
        let token_manager = Arc::new(TokenManager::new(
            config.clone(),
            session.clone(),
            store.clone(),
        )?);
        tracing::debug!("sdk context initialized (auth: {})", config.auth_base_url);
        Ok(Self {
            config,
            store,
            session,
            token_manager,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    /// Authenticate with merchant client credentials.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<OAuthToken, AuthenticationError> {
        self.token_manager.authenticate(client_id, client_secret).await
    }

    /// Force a token refresh.
    pub async fn refresh_token(&self) -> Result<OAuthToken, AuthenticationError> {
        self.token_manager.refresh_token().await
    }

    /// Clear the session and every persisted credential record.
    pub fn logout(&self) {
        self.token_manager.logout();
    }

    /// A client cache bound to this context's session. Each API surface
    /// typically holds its own cache; they all share the same token.
    pub fn client_cache(&self) -> Result<ClientCache, ApiError> {
        ClientCache::new(
            self.config.clone(),
            self.session.clone(),
            self.token_manager.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_token_endpoint(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600,"refresh_token":"rtok"}"#,
                "application/json",
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_authenticate_then_logout() {
        crate::test_logging::init();
        let server = MockServer::start().await;
        mount_token_endpoint(&server).await;

        let config = Config::new(server.uri(), "https://api.example.com");
        let context =
            SdkContext::with_store(config, Arc::new(MemoryCredentialStore::new())).unwrap();

        let token = context.authenticate("c1", "s1").await.unwrap();
        assert_eq!(token.access_token, "tok");
        assert!(context.session().get_valid_access_token().is_some());

        context.logout();
        assert!(context.session().get_valid_access_token().is_none());
        assert!(context.store().load_token().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_survives_across_contexts_via_storage() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server).await;
        let dir = tempfile::tempdir().unwrap();

        let config = Config::new(server.uri(), "https://api.example.com")
            .with_storage_dir(dir.path());
        {
            let context = SdkContext::new(config.clone()).unwrap();
            context.authenticate("c1", "s1").await.unwrap();
        }

        // A new context restores the token lazily from storage.
        let context = SdkContext::new(config).unwrap();
        assert_eq!(
            context.session().get_valid_access_token(),
            Some("tok".to_string())
        );
        assert_eq!(
            context.session().get_credentials().unwrap().client_id,
            "c1"
        );
    }

    #[tokio::test]
    async fn test_client_caches_share_the_session_token() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server).await;

        let config = Config::new(server.uri(), "https://api.example.com");
        let context =
            SdkContext::with_store(config, Arc::new(MemoryCredentialStore::new())).unwrap();
        context.authenticate("c1", "s1").await.unwrap();

        let orders = context.client_cache().unwrap();
        let payments = context.client_cache().unwrap();
        assert!(orders.get_client().is_ok());
        assert!(payments.get_client().is_ok());
    }
}
