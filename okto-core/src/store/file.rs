//! JSON file-backed credential storage.
//!
//! The session is stored at `~/.config/okto/session.json` on Linux,
//! the equivalent application support directory on macOS and
//! `%APPDATA%\okto\session.json` on Windows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CredentialStore, StoreError};
use crate::session::SessionTokens;

const FORMAT_VERSION: u32 = 1;

/// On-disk document.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    /// Version of the file format (for future migrations).
    version: u32,

    tokens: SessionTokens,

    saved_at: DateTime<Utc>,
}

/// Credential store persisting the session as a JSON document.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so readers never observe a partially written session.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file. Nothing is touched on disk
    /// until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at [`default_path`](Self::default_path).
    pub fn at_default_path() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Platform-specific location of the session file.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = directories::ProjectDirs::from("tech", "okto", "okto")
            .ok_or(StoreError::ConfigDirUnavailable)?;
        Ok(dirs.config_dir().join("session.json"))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load(&self) -> Result<Option<SessionTokens>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: SessionFile = serde_json::from_str(&contents)?;
        if file.version != FORMAT_VERSION {
            return Err(StoreError::BackendError {
                message: format!(
                    "unsupported session file version {} in {:?}",
                    file.version, self.path
                ),
            });
        }

        Ok(Some(file.tokens))
    }

    async fn save(&self, tokens: &SessionTokens) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = SessionFile {
            version: FORMAT_VERSION,
            tokens: tokens.clone(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&file)?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!("Saved session to {:?}", self.path);
        Ok(())
    }
}
