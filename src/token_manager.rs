//! Token lifecycle orchestration
//!
//! Sits between the entry points and [`AuthClient`]: authenticates,
//! refreshes with single-flight semantics, persists outcomes, and tears
//! everything down on logout.

use std::sync::Arc;

use crate::auth_client::AuthClient;
use crate::error::AuthenticationError;
use crate::model::config::Config;
use crate::model::token::{Credentials, OAuthToken};
use crate::session::Session;
use crate::store::CredentialStore;

pub struct TokenManager {
    session: Arc<Session>,
    store: Arc<dyn CredentialStore>,
    auth_client: AuthClient,
    /// Serializes refreshes. Held across the network call, unlike the
    /// session's internal lock, so N concurrent 401s produce one refresh.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl TokenManager {
    pub fn new(
        config: Config,
        session: Arc<Session>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, AuthenticationError> {
        let auth_client = AuthClient::new(config, session.clone(), store.clone())?;
        Ok(Self {
            session,
            store,
            auth_client,
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Authenticate with client credentials and install the resulting token.
    ///
    /// The session is updated before storage so the token is usable even
    /// when persistence fails; storage failures are logged, never fatal.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<OAuthToken, AuthenticationError> {
        let credentials = Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        };
        self.session.set_credentials(credentials.clone());

        let result = self.auth_client.authenticate(client_id, client_secret).await?;
        let token = OAuthToken::from_result(&result);
        self.session.set_token(Some(token.clone()));

        if let Err(e) = self.store.save_credentials(&credentials) {
            tracing::warn!("could not persist client credentials: {}", e);
        }
        if let Err(e) = self.store.save_token(&token) {
            tracing::warn!("could not persist token: {}", e);
        }
        tracing::info!("authentication complete (token expires {})", token.expires_at);
        Ok(token)
    }

    /// Explicit refresh: always goes to the network unless another caller
    /// refreshed between the request and the lock.
    pub async fn refresh_token(&self) -> Result<OAuthToken, AuthenticationError> {
        let stale = self.session.get_token().map(|t| t.access_token);
        self.refresh_for_retry(stale).await
    }

    /// Refresh on behalf of a request that just failed with `stale`.
    ///
    /// Double-checked under the refresh lock: if the session already holds
    /// a valid token different from `stale`, someone else refreshed first
    /// and that token is returned without a network call.
    pub async fn refresh_for_retry(
        &self,
        stale: Option<String>,
    ) -> Result<OAuthToken, AuthenticationError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.get_token() {
            if current.is_valid() && stale.as_deref() != Some(current.access_token.as_str()) {
                tracing::debug!("token already refreshed by another caller; reusing it");
                return Ok(current);
            }
        }

        let result = self.auth_client.refresh_token().await?;
        let token = OAuthToken::from_result(&result);
        self.session.set_token(Some(token.clone()));
        if let Err(e) = self.store.save_token(&token) {
            tracing::warn!("could not persist refreshed token: {}", e);
        }
        tracing::info!("token refreshed (expires {})", token.expires_at);
        Ok(token)
    }

    /// Current access token, refreshing if expired.
    ///
    /// Returns `None` when no token exists or the refresh fails; a failed
    /// refresh also clears the dead token so later calls start clean.
    pub async fn get_access_token(&self) -> Option<String> {
        if let Some(access_token) = self.session.get_valid_access_token() {
            return Some(access_token);
        }

        let stale = self.session.get_token().map(|t| t.access_token);
        if stale.is_none() && self.session.get_credentials().is_none() {
            return None;
        }

        match self.refresh_for_retry(stale).await {
            Ok(token) => Some(token.access_token),
            Err(e) => {
                tracing::warn!("could not refresh expired token: {}", e);
                self.session.set_token(None);
                if let Err(e) = self.store.clear_token() {
                    tracing::warn!("could not clear dead token from storage: {}", e);
                }
                None
            }
        }
    }

    /// Clear every credential record and reset the session.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear_all() {
            tracing::warn!("could not clear secure storage on logout: {}", e);
        }
        self.session.clear();
        tracing::info!("logged out; session and storage cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager(server_uri: &str) -> (Arc<Session>, Arc<MemoryCredentialStore>, TokenManager) {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = Arc::new(Session::new(store.clone()));
        let config = Config::new(server_uri, "https://api.example.com");
        let manager = TokenManager::new(config, session.clone(), store.clone()).unwrap();
        (session, store, manager)
    }

    fn token_body(access: &str) -> String {
        format!(
            r#"{{"access_token":"{access}","token_type":"Bearer","expires_in":3600,"refresh_token":"rtok"}}"#
        )
    }

    async fn mount_token_endpoint(server: &MockServer, access: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(token_body(access), "application/json"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_authenticate_installs_and_persists() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "tok").await;

        let (session, store, manager) = manager(&server.uri());
        let token = manager.authenticate("c1", "s1").await.unwrap();
        assert_eq!(token.access_token, "tok");

        assert_eq!(session.get_valid_access_token(), Some("tok".to_string()));
        assert_eq!(
            store.load_token().unwrap().unwrap().access_token,
            "tok"
        );
        assert_eq!(
            store.load_credentials().unwrap().unwrap().client_id,
            "c1"
        );
    }

    #[tokio::test]
    async fn test_failed_authentication_leaves_no_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (session, store, manager) = manager(&server.uri());
        assert_eq!(
            manager.authenticate("c1", "bad").await.unwrap_err(),
            AuthenticationError::InvalidCredentials
        );
        assert!(session.get_valid_access_token().is_none());
        assert!(store.load_token().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_for_retry_skips_network_when_already_refreshed() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "fresh").await;

        let (session, _store, manager) = manager(&server.uri());
        session.set_credentials(Credentials {
            client_id: "c1".to_string(),
            client_secret: "s1".to_string(),
        });
        session.set_token(Some(OAuthToken {
            access_token: "fresh".to_string(),
            refresh_token: Some("rtok".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(3600),
        }));

        // Caller's stale token differs from the session's valid one.
        let token = manager
            .refresh_for_retry(Some("stale".to_string()))
            .await
            .unwrap();
        assert_eq!(token.access_token, "fresh");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_retries_trigger_one_refresh() {
        crate::test_logging::init();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(token_body("fresh"), "application/json")
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .mount(&server)
            .await;

        let (session, _store, manager) = manager(&server.uri());
        session.set_credentials(Credentials {
            client_id: "c1".to_string(),
            client_secret: "s1".to_string(),
        });
        session.set_token(Some(OAuthToken {
            access_token: "stale".to_string(),
            refresh_token: Some("rtok".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(3600),
        }));

        let manager = Arc::new(manager);
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager
                        .refresh_for_retry(Some("stale".to_string()))
                        .await
                        .unwrap()
                        .access_token
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), "fresh");
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_access_token_returns_valid_token_without_network() {
        let server = MockServer::start().await;
        let (session, _store, manager) = manager(&server.uri());
        session.set_token(Some(OAuthToken {
            access_token: "live".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(3600),
        }));

        assert_eq!(manager.get_access_token().await, Some("live".to_string()));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_access_token_refreshes_expired_token() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "fresh").await;

        let (session, _store, manager) = manager(&server.uri());
        session.set_credentials(Credentials {
            client_id: "c1".to_string(),
            client_secret: "s1".to_string(),
        });
        session.set_token(Some(OAuthToken {
            access_token: "dead".to_string(),
            refresh_token: Some("rtok".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: chrono::Utc::now() - chrono::Duration::seconds(60),
        }));

        assert_eq!(manager.get_access_token().await, Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn test_get_access_token_clears_unrefreshable_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (session, store, manager) = manager(&server.uri());
        session.set_credentials(Credentials {
            client_id: "c1".to_string(),
            client_secret: "s1".to_string(),
        });
        session.set_token(Some(OAuthToken {
            access_token: "dead".to_string(),
            refresh_token: Some("rtok".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: chrono::Utc::now() - chrono::Duration::seconds(60),
        }));
        store.save_token(&session.get_token().unwrap()).unwrap();

        assert_eq!(manager.get_access_token().await, None);
        assert!(session.get_token().is_none());
        assert!(store.load_token().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_access_token_without_anything_is_none() {
        let server = MockServer::start().await;
        let (_session, _store, manager) = manager(&server.uri());
        assert_eq!(manager.get_access_token().await, None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_storage() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "tok").await;

        let (session, store, manager) = manager(&server.uri());
        manager.authenticate("c1", "s1").await.unwrap();

        manager.logout();
        assert!(session.get_token().is_none());
        assert!(session.get_credentials().is_none());
        assert!(store.load_token().unwrap().is_none());
        assert!(store.load_credentials().unwrap().is_none());
    }
}
