//! Session token types.
//!
//! This module provides:
//! - [`SessionTokens`] - The auth/refresh/device token triple
//! - [`AuthResponseData`] - Wire payload returned by authenticate and refresh
//!
//! The lifecycle itself lives in [`crate::session_manager`].

use serde::{Deserialize, Serialize};

use crate::error::OktoError;
use crate::store::Secret;

/// The token triple identifying an authenticated client.
///
/// Either all three tokens are set (authenticated) or all three are empty
/// (logged out). [`SessionTokens::new`] refuses anything in between; a value
/// deserialized from storage can be checked with
/// [`is_consistent`](Self::is_consistent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    auth_token: Secret,
    refresh_token: Secret,
    device_token: Secret,
}

impl SessionTokens {
    /// Build an authenticated session. Every token must be non-empty.
    pub fn new(
        auth_token: impl Into<String>,
        refresh_token: impl Into<String>,
        device_token: impl Into<String>,
    ) -> Result<Self, OktoError> {
        let tokens = Self {
            auth_token: Secret::new(auth_token),
            refresh_token: Secret::new(refresh_token),
            device_token: Secret::new(device_token),
        };

        if !tokens.is_authenticated() {
            let missing: Vec<&str> = [
                ("auth_token", &tokens.auth_token),
                ("refresh_token", &tokens.refresh_token),
                ("device_token", &tokens.device_token),
            ]
            .into_iter()
            .filter(|(_, secret)| secret.is_empty())
            .map(|(name, _)| name)
            .collect();

            return Err(OktoError::InvalidSession {
                message: format!("missing {}", missing.join(", ")),
            });
        }

        Ok(tokens)
    }

    /// The cleared session.
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Token sent as `Authorization: Bearer ...` on regular requests.
    pub fn auth_token(&self) -> &Secret {
        &self.auth_token
    }

    /// Token sent as `x-refresh-authorization` when refreshing.
    pub fn refresh_token(&self) -> &Secret {
        &self.refresh_token
    }

    /// Token sent as `x-device-token` when refreshing.
    pub fn device_token(&self) -> &Secret {
        &self.device_token
    }

    /// All three tokens are present.
    pub fn is_authenticated(&self) -> bool {
        !self.auth_token.is_empty()
            && !self.refresh_token.is_empty()
            && !self.device_token.is_empty()
    }

    /// All three tokens are empty.
    pub fn is_logged_out(&self) -> bool {
        self.auth_token.is_empty() && self.refresh_token.is_empty() && self.device_token.is_empty()
    }

    /// Either fully authenticated or fully logged out.
    pub fn is_consistent(&self) -> bool {
        self.is_authenticated() || self.is_logged_out()
    }
}

/// `data` payload of the authenticate and refresh endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponseData {
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub refresh_auth_token: Option<String>,
    #[serde(default)]
    pub device_token: Option<String>,
}

impl TryFrom<AuthResponseData> for SessionTokens {
    type Error = OktoError;

    fn try_from(data: AuthResponseData) -> Result<Self, Self::Error> {
        SessionTokens::new(
            data.auth_token.unwrap_or_default(),
            data.refresh_auth_token.unwrap_or_default(),
            data.device_token.unwrap_or_default(),
        )
    }
}
