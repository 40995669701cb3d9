//! In-memory credential store
//!
//! Backs tests and environments where durable storage is unavailable.
//! Same record semantics as the file store, minus the durability.

use parking_lot::Mutex;

use crate::error::StorageError;
use crate::model::token::{Credentials, OAuthToken, ShortLivedToken};
use crate::store::CredentialStore;

#[derive(Debug, Default)]
struct Records {
    token: Option<OAuthToken>,
    credentials: Option<Credentials>,
    short_lived_token: Option<ShortLivedToken>,
}

/// Credential store holding records in process memory only.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: Mutex<Records>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save_token(&self, token: &OAuthToken) -> Result<(), StorageError> {
        self.records.lock().token = Some(token.clone());
        Ok(())
    }

    fn load_token(&self) -> Result<Option<OAuthToken>, StorageError> {
        Ok(self.records.lock().token.clone())
    }

    fn clear_token(&self) -> Result<(), StorageError> {
        self.records.lock().token = None;
        Ok(())
    }

    fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        self.records.lock().credentials = Some(credentials.clone());
        Ok(())
    }

    fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        Ok(self.records.lock().credentials.clone())
    }

    fn clear_credentials(&self) -> Result<(), StorageError> {
        self.records.lock().credentials = None;
        Ok(())
    }

    fn save_short_lived_token(&self, token: &ShortLivedToken) -> Result<(), StorageError> {
        self.records.lock().short_lived_token = Some(token.clone());
        Ok(())
    }

    fn load_short_lived_token(&self) -> Result<Option<ShortLivedToken>, StorageError> {
        Ok(self
            .records
            .lock()
            .short_lived_token
            .clone()
            .filter(ShortLivedToken::is_valid))
    }

    fn clear_short_lived_token(&self) -> Result<(), StorageError> {
        self.records.lock().short_lived_token = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_clear_all_wipes_every_record() {
        let store = MemoryCredentialStore::new();
        store
            .save_credentials(&Credentials {
                client_id: "c1".to_string(),
                client_secret: "s1".to_string(),
            })
            .unwrap();
        store
            .save_short_lived_token(&ShortLivedToken {
                token: "jwt".to_string(),
                expires_at: Utc::now() + Duration::seconds(600),
            })
            .unwrap();

        store.clear_all().unwrap();
        assert!(store.load_credentials().unwrap().is_none());
        assert!(store.load_short_lived_token().unwrap().is_none());
        assert!(store.load_token().unwrap().is_none());
    }

    #[test]
    fn test_short_lived_token_window_applies() {
        let store = MemoryCredentialStore::new();
        store
            .save_short_lived_token(&ShortLivedToken {
                token: "jwt".to_string(),
                expires_at: Utc::now() + Duration::seconds(120),
            })
            .unwrap();
        assert!(store.load_short_lived_token().unwrap().is_none());
    }
}
