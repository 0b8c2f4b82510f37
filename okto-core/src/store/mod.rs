//! Credential storage abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`CredentialStore`] - Trait for session persistence backends
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`FileStore`] - JSON file in the platform config directory
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select a backend with graceful fallback
//!
//! A store only ever sees a complete [`SessionTokens`] triple. Backends must
//! write it as one unit so a crash can never leave half a session behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use okto_core::store::{CredentialStore, MemoryStore};
//! use okto_core::SessionTokens;
//!
//! let store = MemoryStore::new();
//! let tokens = SessionTokens::new("auth", "refresh", "device")?;
//! store.save(&tokens).await?;
//! assert_eq!(store.load().await?, Some(tokens));
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::session::SessionTokens;

mod file;
#[cfg(feature = "keyring-store")]
mod keyring;
mod memory;

pub use file::FileStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;
pub use memory::MemoryStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the backing buffer is wiped when the secret is dropped.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// An empty secret, used for the logged-out session.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret holds no value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// I/O error reading or writing a store file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },

    /// No platform configuration directory could be determined.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,
}

/// Durable storage for the current session.
///
/// Implementations include:
/// - [`MemoryStore`] - In-memory storage for testing
/// - [`FileStore`] - JSON file on disk
/// - [`KeyringStore`] (with `keyring-store` feature) - OS keyring
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted session.
    ///
    /// Returns `Ok(None)` if nothing has been saved yet.
    async fn load(&self) -> Result<Option<SessionTokens>, StoreError>;

    /// Persist the session, replacing whatever was stored before.
    ///
    /// A logged-out (all empty) session is saved like any other.
    async fn save(&self, tokens: &SessionTokens) -> Result<(), StoreError>;
}

/// Which backend [`create_store`] should try to build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StoreBackend {
    /// Non-persistent, process-local storage.
    Memory,

    /// JSON file; no path uses [`FileStore::default_path`].
    File {
        #[serde(default)]
        path: Option<PathBuf>,
    },

    /// Platform keyring.
    #[default]
    Keyring,
}

/// Create a credential store with graceful backend fallback.
///
/// # Backend Selection Logic
///
/// - [`StoreBackend::Keyring`]: tries a [`KeyringStore`], then the default
///   [`FileStore`], then [`MemoryStore`].
/// - [`StoreBackend::File`]: tries the file store, falls back to memory.
/// - [`StoreBackend::Memory`]: always memory.
///
/// Every fallback is logged at `warn` since the session will not survive a
/// restart once memory storage is chosen.
pub fn create_store(backend: &StoreBackend) -> Arc<dyn CredentialStore> {
    match backend {
        StoreBackend::Keyring => {
            #[cfg(feature = "keyring-store")]
            match KeyringStore::try_new("okto") {
                Ok(store) => {
                    tracing::info!("Using OS keyring for session storage");
                    return Arc::new(store);
                }
                Err(e) => {
                    tracing::warn!("Keyring unavailable ({}), falling back to file store", e);
                }
            }

            #[cfg(not(feature = "keyring-store"))]
            tracing::warn!(
                "Keyring storage requested but keyring-store feature not enabled, \
                 falling back to file store"
            );

            create_store(&StoreBackend::File { path: None })
        }
        StoreBackend::File { path } => {
            let store = match path {
                Some(path) => Ok(FileStore::new(path.clone())),
                None => FileStore::at_default_path(),
            };
            match store {
                Ok(store) => {
                    tracing::info!("Using file session storage at {:?}", store.path());
                    Arc::new(store)
                }
                Err(e) => {
                    tracing::warn!(
                        "File store unavailable ({}), falling back to memory store. \
                         The session will not persist across restarts.",
                        e
                    );
                    Arc::new(MemoryStore::new())
                }
            }
        }
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory session storage");
            Arc::new(MemoryStore::new())
        }
    }
}
