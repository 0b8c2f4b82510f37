//! In-memory credential storage implementation.

use async_trait::async_trait;
use std::sync::RwLock;

use super::{CredentialStore, StoreError};
use crate::session::SessionTokens;

/// In-memory credential store for testing and development.
///
/// This store is not persistent; data is lost when the process exits.
///
/// # Thread Safety
///
/// This implementation uses interior mutability via `RwLock` and is
/// safe to share across threads.
pub struct MemoryStore {
    data: RwLock<Option<SessionTokens>>,
    saves: RwLock<usize>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(None),
            saves: RwLock::new(0),
        }
    }

    /// Create a memory store that already holds a session.
    pub fn with_tokens(tokens: SessionTokens) -> Self {
        Self {
            data: RwLock::new(Some(tokens)),
            saves: RwLock::new(0),
        }
    }

    /// Number of times [`save`](CredentialStore::save) has been called.
    pub fn save_count(&self) -> usize {
        self.saves.read().map(|n| *n).unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_session = self.data.read().map(|d| d.is_some()).unwrap_or(false);
        f.debug_struct("MemoryStore")
            .field("has_session", &has_session)
            .finish()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self) -> Result<Option<SessionTokens>, StoreError> {
        let data = self.data.read().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        Ok(data.clone())
    }

    async fn save(&self, tokens: &SessionTokens) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        *data = Some(tokens.clone());
        drop(data);

        let mut saves = self.saves.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        *saves += 1;
        Ok(())
    }
}
