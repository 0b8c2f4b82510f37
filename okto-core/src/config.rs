//! Client configuration.
//!
//! [`ClientConfig`] is plain data: it can be built in code or deserialized
//! from a TOML/JSON document. The CLI reads it from
//! `<config dir>/okto/config.toml`.
//!
//! ```toml
//! api_key = "..."
//! environment = "sandbox"
//! request_timeout_secs = 30
//!
//! [poll]
//! interval_ms = 2000
//! max_attempts = 50
//! retry_policy = "retry_all"
//!
//! [store]
//! kind = "file"
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::OktoError;
use crate::poller::{PollConfig, RetryPolicy};
use crate::store::{Secret, StoreBackend};

const PRODUCTION_URL: &str = "https://apigw.okto.tech";
const STAGING_URL: &str = "https://3p-bff.oktostage.com";
const SANDBOX_URL: &str = "https://sandbox-api.okto.tech";

/// Deployment the client talks to.
///
/// Labels parse case-insensitively. Anything that is not a production or
/// staging label selects the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Production,
    Staging,
    #[default]
    Sandbox,
}

impl Environment {
    /// Fixed base URL of the deployment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_URL,
            Self::Staging => STAGING_URL,
            Self::Sandbox => SANDBOX_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Sandbox => "sandbox",
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Sandbox,
        })
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        let Ok(env) = s.parse::<Environment>();
        env
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        env.as_str().to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[poll]` table: default budget for job polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_attempts: u32,
    pub retry_policy: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        let defaults = PollConfig::default();
        Self {
            interval_ms: defaults.interval.as_millis() as u64,
            max_attempts: defaults.max_attempts,
            retry_policy: defaults.retry_policy,
        }
    }
}

impl From<&PollSettings> for PollConfig {
    fn from(settings: &PollSettings) -> Self {
        PollConfig::new(
            Duration::from_millis(settings.interval_ms),
            settings.max_attempts,
        )
        .with_retry_policy(settings.retry_policy)
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Everything needed to build an [`OktoClient`](crate::OktoClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Sent as `x-api-key` on every call.
    pub api_key: Secret,

    #[serde(default)]
    pub environment: Environment,

    /// Overrides the environment's base URL (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub poll: PollSettings,

    #[serde(default)]
    pub store: StoreBackend,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, environment: Environment) -> Self {
        Self {
            api_key: Secret::new(api_key),
            environment,
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            poll: PollSettings::default(),
            store: StoreBackend::default(),
        }
    }

    /// Point the client at an explicit base URL instead of the environment's.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_store(mut self, store: StoreBackend) -> Self {
        self.store = store;
        self
    }

    /// Base URL actually used: the override if set, otherwise the environment's.
    pub fn resolved_base_url(&self) -> Result<Url, OktoError> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url());

        Url::parse(raw).map_err(|e| OktoError::Config {
            message: format!("invalid base URL {:?}: {}", raw, e),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::from(&self.poll)
    }

    /// Reject configurations that cannot produce a working client.
    pub fn validate(&self) -> Result<(), OktoError> {
        if self.api_key.is_empty() {
            return Err(OktoError::Config {
                message: "api_key must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(OktoError::Config {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        self.resolved_base_url()?;
        Ok(())
    }
}
