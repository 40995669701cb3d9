//! Secure credential persistence
//!
//! One namespace per logical record (`oauth_token`, `credentials`,
//! `short_lived_token`), no cross-record transactions. Loads distinguish
//! "nothing stored" (`Ok(None)`) from "storage broken" (`Err`) so callers
//! can treat absence uniformly.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::error::StorageError;
use crate::model::token::{Credentials, OAuthToken, ShortLivedToken};

/// Durable key/value persistence for OAuth tokens, client credentials and
/// the secondary short-lived JWT. Survives process restarts.
///
/// Every save overwrites the existing entry (delete-then-add); every clear
/// is idempotent - absence of the record is success, not an error.
pub trait CredentialStore: Send + Sync {
    fn save_token(&self, token: &OAuthToken) -> Result<(), StorageError>;
    fn load_token(&self) -> Result<Option<OAuthToken>, StorageError>;
    fn clear_token(&self) -> Result<(), StorageError>;

    fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError>;
    fn load_credentials(&self) -> Result<Option<Credentials>, StorageError>;
    fn clear_credentials(&self) -> Result<(), StorageError>;

    fn save_short_lived_token(&self, token: &ShortLivedToken) -> Result<(), StorageError>;
    /// Returns `Ok(None)` for a stored value that is expired or inside the
    /// proactive refresh window; the stale record stays on disk until the
    /// next explicit clear.
    fn load_short_lived_token(&self) -> Result<Option<ShortLivedToken>, StorageError>;
    fn clear_short_lived_token(&self) -> Result<(), StorageError>;

    /// Remove all records. Used on logout.
    fn clear_all(&self) -> Result<(), StorageError> {
        self.clear_token()?;
        self.clear_credentials()?;
        self.clear_short_lived_token()
    }
}
