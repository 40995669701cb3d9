//! File-backed credential store
//!
//! One JSON file per record under the configured storage directory, written
//! with owner-only permissions. "File does not exist" and "permission
//! unavailable" (sandboxed test environments) read as empty results, not
//! errors.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;
use crate::model::token::{Credentials, OAuthToken, ShortLivedToken};
use crate::store::CredentialStore;

const TOKEN_RECORD: &str = "oauth_token.json";
const CREDENTIALS_RECORD: &str = "credentials.json";
const SHORT_LIVED_RECORD: &str = "short_lived_token.json";

/// Credential store persisting records as JSON files with 0o600 permissions.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Delete-then-write so a failed write never leaves two conflicting
    /// entries behind.
    fn write_record<T: Serialize>(&self, name: &str, record: &T) -> Result<(), StorageError> {
        let path = self.record_path(name);
        let json = serde_json::to_vec_pretty(record).map_err(StorageError::EncodeFailed)?;

        std::fs::create_dir_all(&self.dir).map_err(StorageError::SaveFailed)?;
        delete_file(&path).map_err(StorageError::SaveFailed)?;
        std::fs::write(&path, &json).map_err(StorageError::SaveFailed)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        tracing::debug!("saved {} to secure storage", name);
        Ok(())
    }

    fn read_record<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        let path = self.record_path(name);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if recoverable_as_empty(&e) => return Ok(None),
            Err(e) => {
                tracing::error!("secure storage read failed for {}: {}", name, e);
                return Err(StorageError::ReadFailed(e));
            }
        };

        match serde_json::from_slice(&data) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::error!("failed to decode stored {}: {}", name, e);
                Err(StorageError::DecodeFailed(e))
            }
        }
    }

    fn clear_record(&self, name: &str) -> Result<(), StorageError> {
        delete_file(&self.record_path(name)).map_err(StorageError::DeleteFailed)?;
        tracing::debug!("cleared {} from secure storage", name);
        Ok(())
    }
}

/// Remove a file, treating "already gone" and "permission unavailable" as
/// success.
fn delete_file(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if recoverable_as_empty(&e) => Ok(()),
        Err(e) => {
            tracing::error!("secure storage delete failed: {}", e);
            Err(e)
        }
    }
}

fn recoverable_as_empty(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied)
}

impl CredentialStore for FileCredentialStore {
    fn save_token(&self, token: &OAuthToken) -> Result<(), StorageError> {
        self.write_record(TOKEN_RECORD, token)?;
        tracing::info!("saved access token to secure storage");
        Ok(())
    }

    fn load_token(&self) -> Result<Option<OAuthToken>, StorageError> {
        self.read_record(TOKEN_RECORD)
    }

    fn clear_token(&self) -> Result<(), StorageError> {
        self.clear_record(TOKEN_RECORD)
    }

    fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        self.write_record(CREDENTIALS_RECORD, credentials)?;
        tracing::info!("saved client credentials to secure storage");
        Ok(())
    }

    fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        self.read_record(CREDENTIALS_RECORD)
    }

    fn clear_credentials(&self) -> Result<(), StorageError> {
        self.clear_record(CREDENTIALS_RECORD)
    }

    fn save_short_lived_token(&self, token: &ShortLivedToken) -> Result<(), StorageError> {
        self.write_record(SHORT_LIVED_RECORD, token)?;
        tracing::info!("saved short-lived token to secure storage (expires at {})", token.expires_at);
        Ok(())
    }

    fn load_short_lived_token(&self) -> Result<Option<ShortLivedToken>, StorageError> {
        let token: Option<ShortLivedToken> = self.read_record(SHORT_LIVED_RECORD)?;
        match token {
            Some(token) if !token.is_valid() => {
                tracing::debug!("stored short-lived token is expired or near expiry");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn clear_short_lived_token(&self) -> Result<(), StorageError> {
        self.clear_record(SHORT_LIVED_RECORD)
    }
}
