//! Session lifecycle: authenticate, refresh, logout.
//!
//! [`SessionManager`] owns the current [`SessionTokens`] and is the only
//! writer of both the in-memory copy and the [`CredentialStore`].
//!
//! # Consistency
//!
//! - Tokens are replaced as one value behind a `parking_lot::RwLock`; a
//!   reader sees either the previous or the next triple, never a mix.
//! - Writers (authenticate, refresh, logout) are serialized by an async
//!   mutex held across the remote call and the persistence write, so two
//!   refreshes never interleave.
//! - The store is written before the in-memory swap. A failed save leaves the
//!   old session in place.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use okto_core::{ClientConfig, Environment, MemoryStore, SessionManager, Transport};
//!
//! let config = ClientConfig::new("api-key", Environment::Sandbox);
//! let manager = SessionManager::load(Transport::new(&config)?, Arc::new(MemoryStore::new())).await?;
//! manager.authenticate("google-id-token").await?;
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Method;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::OktoError;
use crate::session::{AuthResponseData, SessionTokens};
use crate::store::{CredentialStore, Secret};
use crate::transport::Transport;

/// Exchanges an identity token for a session.
pub const AUTHENTICATE_PATH: &str = "/api/v2/authenticate";

/// Mints a new session from the refresh and device tokens.
pub const REFRESH_PATH: &str = "/api/v1/refresh_token";

pub const REFRESH_AUTHORIZATION_HEADER: &str = "x-refresh-authorization";
pub const DEVICE_TOKEN_HEADER: &str = "x-device-token";

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    id_token: &'a str,
}

/// Owner of the client's single active session.
pub struct SessionManager {
    transport: Transport,
    store: Arc<dyn CredentialStore>,
    tokens: RwLock<SessionTokens>,
    write_gate: Mutex<()>,
}

impl SessionManager {
    /// Build a manager, loading the persisted session once.
    ///
    /// A persisted triple that is only partially populated is discarded and
    /// the manager starts logged out.
    pub async fn load(
        transport: Transport,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, OktoError> {
        let tokens = match store.load().await? {
            Some(tokens) if tokens.is_consistent() => {
                if tokens.is_authenticated() {
                    tracing::info!("Restored persisted session");
                }
                tokens
            }
            Some(_) => {
                tracing::warn!("Discarding partially populated persisted session");
                SessionTokens::logged_out()
            }
            None => {
                tracing::debug!("No persisted session found");
                SessionTokens::logged_out()
            }
        };

        Ok(Self {
            transport,
            store,
            tokens: RwLock::new(tokens),
            write_gate: Mutex::new(()),
        })
    }

    /// Exchange an external identity token for a new session.
    ///
    /// Any failure of the remote exchange is reported as
    /// [`OktoError::AuthenticationFailed`]; the current session is left
    /// untouched in that case.
    pub async fn authenticate(&self, id_token: &str) -> Result<SessionTokens, OktoError> {
        let _guard = self.write_gate.lock().await;

        let request = self
            .transport
            .request(Method::POST, AUTHENTICATE_PATH)
            .json(&AuthenticateRequest { id_token });

        let tokens = self
            .exchange(request)
            .await
            .map_err(|e| OktoError::AuthenticationFailed {
                message: e.to_string(),
            })?;

        self.replace(tokens.clone()).await?;
        tracing::info!("Authenticated new session");
        Ok(tokens)
    }

    /// Mint a new session from the current refresh and device tokens.
    ///
    /// Fails with [`OktoError::RefreshFailed`] when no session is held or the
    /// remote call fails. Treat that as "re-authenticate", not as transient.
    pub async fn refresh(&self) -> Result<SessionTokens, OktoError> {
        let _guard = self.write_gate.lock().await;

        let current = self.snapshot();
        if !current.is_authenticated() {
            return Err(OktoError::RefreshFailed {
                message: "no active session to refresh".to_string(),
            });
        }

        let request = self
            .transport
            .request(Method::POST, REFRESH_PATH)
            .header(
                REFRESH_AUTHORIZATION_HEADER,
                format!("Bearer {}", current.refresh_token().expose()),
            )
            .header(DEVICE_TOKEN_HEADER, current.device_token().expose());

        let tokens = match self.exchange(request).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!("Failed to refresh session: {}", e);
                return Err(OktoError::RefreshFailed {
                    message: e.to_string(),
                });
            }
        };

        self.replace(tokens.clone()).await?;
        tracing::info!("Refreshed session");
        Ok(tokens)
    }

    /// Clear the session locally and persist the cleared state.
    ///
    /// The server is not notified.
    pub async fn logout(&self) -> Result<(), OktoError> {
        let _guard = self.write_gate.lock().await;
        self.replace(SessionTokens::logged_out()).await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Token for the `Authorization` header; empty when logged out.
    pub fn current_auth_token(&self) -> Secret {
        self.tokens.read().auth_token().clone()
    }

    /// Consistent copy of the whole triple.
    pub fn snapshot(&self) -> SessionTokens {
        self.tokens.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.read().is_authenticated()
    }

    /// Send an authenticate/refresh request and turn the envelope into tokens.
    async fn exchange(&self, request: reqwest::RequestBuilder) -> Result<SessionTokens, OktoError> {
        let envelope = self
            .transport
            .send(request)
            .await?
            .error_for_status()?
            .into_envelope::<AuthResponseData>()?;

        SessionTokens::try_from(envelope.into_data())
    }

    /// Persist, then swap. Callers hold the write gate.
    async fn replace(&self, tokens: SessionTokens) -> Result<(), OktoError> {
        self.store.save(&tokens).await?;
        *self.tokens.write() = tokens;
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("transport", &self.transport)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;
    use url::Url;

    fn offline_transport() -> Transport {
        // Port 9 (discard) is never served in test environments.
        Transport::with_timeout(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Secret::new("test-key"),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_restores_persisted_session() {
        let tokens = SessionTokens::new("a", "r", "d").unwrap();
        let store = Arc::new(MemoryStore::with_tokens(tokens.clone()));

        let manager = SessionManager::load(offline_transport(), store).await.unwrap();

        assert!(manager.is_authenticated());
        assert_eq!(manager.snapshot(), tokens);
        assert_eq!(manager.current_auth_token().expose(), "a");
    }

    #[tokio::test]
    async fn test_load_discards_partial_session() {
        let partial: SessionTokens = serde_json::from_str(
            r#"{"auth_token":"a","refresh_token":"","device_token":""}"#,
        )
        .unwrap();
        let store = Arc::new(MemoryStore::with_tokens(partial));

        let manager = SessionManager::load(offline_transport(), store).await.unwrap();

        assert!(!manager.is_authenticated());
        assert!(manager.current_auth_token().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_and_persists() {
        let store = Arc::new(MemoryStore::with_tokens(SessionTokens::new("a", "r", "d").unwrap()));
        let manager = SessionManager::load(offline_transport(), store.clone()).await.unwrap();

        manager.logout().await.unwrap();

        assert!(manager.snapshot().is_logged_out());
        assert_eq!(store.load().await.unwrap(), Some(SessionTokens::logged_out()));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_logout_when_already_logged_out() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::load(offline_transport(), store.clone()).await.unwrap();

        manager.logout().await.unwrap();

        assert!(manager.snapshot().is_logged_out());
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_session_fails_fast() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::load(offline_transport(), store.clone()).await.unwrap();

        let result = manager.refresh().await;

        assert!(matches!(result, Err(OktoError::RefreshFailed { .. })));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_network_failure_is_typed() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::load(offline_transport(), store.clone()).await.unwrap();

        let result = manager.authenticate("id-token").await;

        assert!(matches!(result, Err(OktoError::AuthenticationFailed { .. })));
        assert!(!manager.is_authenticated());
        assert_eq!(store.save_count(), 0);
    }
}
