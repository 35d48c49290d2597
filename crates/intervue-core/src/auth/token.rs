use std::sync::Arc;

use tracing::warn;

use super::storage::{KeyValueStorage, StorageError};

/// Storage key holding the bearer credential
pub const TOKEN_KEY: &str = "token";

/// Accessor for the bearer credential.
///
/// Clone is cheap and every clone sees the same storage.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Current credential. Storage failures and empty values read as absent.
    pub fn get_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read token from storage");
                None
            }
        }
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, token)
    }

    pub fn remove_token(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.has_token())
            .finish()
    }
}
