//! In-memory session
//!
//! Single source of truth for the credentials and token this process
//! currently believes are valid, lazily reconciled with the credential
//! store. One instance per SDK context.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::token::{Credentials, OAuthToken};
use crate::store::CredentialStore;

/// Restoration state of the token slot.
///
/// Gates when storage is consulted: a miss parks the slot in
/// `ExplicitlyCleared` so secure storage is not re-read on every access,
/// and a deliberate clear is never silently resurrected from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestoreState {
    /// No read has consulted storage yet.
    NotYetRestored,
    /// The in-memory token mirrors the last restore or explicit set.
    Restored,
    /// The slot was cleared (or a restore missed); reads return `None`
    /// without touching storage until the next `set_token`.
    ExplicitlyCleared,
}

impl RestoreState {
    /// State after an explicit write to the token slot.
    fn after_set(token_present: bool) -> Self {
        if token_present {
            RestoreState::Restored
        } else {
            RestoreState::ExplicitlyCleared
        }
    }

    /// State after a restoration attempt against storage.
    fn after_restore(found: bool) -> Self {
        if found {
            RestoreState::Restored
        } else {
            RestoreState::ExplicitlyCleared
        }
    }
}

#[derive(Debug)]
struct SessionInner {
    credentials: Option<Credentials>,
    token: Option<OAuthToken>,
    restore_state: RestoreState,
}

/// Concurrency-safe credential/token cache.
///
/// All reads and writes are serialized through one mutex; the
/// check-then-maybe-restore sequence runs as a single critical section so
/// two callers never both decide to restore. Storage access is synchronous
/// and brief; network calls never happen under this lock.
pub struct Session {
    store: Arc<dyn CredentialStore>,
    inner: Mutex<SessionInner>,
}

impl Session {
    /// Create a session, restoring client credentials from storage.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let credentials = match store.load_credentials() {
            Ok(Some(credentials)) => {
                tracing::debug!("restored client credentials from secure storage");
                Some(credentials)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("could not restore credentials from secure storage: {}", e);
                None
            }
        };

        Self {
            store,
            inner: Mutex::new(SessionInner {
                credentials,
                token: None,
                restore_state: RestoreState::NotYetRestored,
            }),
        }
    }

    pub fn get_credentials(&self) -> Option<Credentials> {
        self.inner.lock().credentials.clone()
    }

    pub fn set_credentials(&self, credentials: Credentials) {
        self.inner.lock().credentials = Some(credentials);
    }

    /// Get the current token, restoring from storage on first access.
    ///
    /// An expired-but-present token is still returned so a caller can
    /// attempt a refresh.
    pub fn get_token(&self) -> Option<OAuthToken> {
        let mut inner = self.inner.lock();

        if let Some(token) = &inner.token {
            return Some(token.clone());
        }

        match inner.restore_state {
            RestoreState::NotYetRestored => {
                let restored = match self.store.load_token() {
                    Ok(token) => token,
                    Err(e) => {
                        tracing::warn!("could not restore token from secure storage: {}", e);
                        None
                    }
                };
                inner.restore_state = RestoreState::after_restore(restored.is_some());
                if let Some(token) = &restored {
                    if token.is_valid() {
                        tracing::info!(
                            "restored valid token from secure storage (expires {})",
                            token.expires_at
                        );
                    } else {
                        tracing::warn!(
                            "restored expired token from secure storage (expired {}); will refresh on next call",
                            token.expires_at
                        );
                    }
                }
                inner.token = restored.clone();
                restored
            }
            RestoreState::Restored | RestoreState::ExplicitlyCleared => None,
        }
    }

    /// Replace the token slot. `None` marks the slot explicitly cleared so
    /// subsequent reads do not resurrect a stored token.
    pub fn set_token(&self, token: Option<OAuthToken>) {
        let mut inner = self.inner.lock();
        inner.restore_state = RestoreState::after_set(token.is_some());
        inner.token = token;
    }

    /// Access token string, only while it has not expired.
    pub fn get_valid_access_token(&self) -> Option<String> {
        self.get_token()
            .filter(OAuthToken::is_valid)
            .map(|token| token.access_token)
    }

    /// Wipe credentials and token; forces the explicitly-cleared state.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.credentials = None;
        inner.token = None;
        inner.restore_state = RestoreState::ExplicitlyCleared;
    }
}
