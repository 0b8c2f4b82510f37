//! Shared HTTP plumbing.
//!
//! [`Transport`] owns the reqwest client, base URL and API key. Both the
//! session manager (authenticate/refresh) and the request executor build their
//! requests through it, so every call carries the same fixed headers.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::OktoError;
use crate::model::ApiEnvelope;
use crate::store::Secret;

/// Stable client identifier sent as `user-agent`.
pub const USER_AGENT: &str = concat!("okto-rs/", env!("CARGO_PKG_VERSION"));

/// Header carrying the application API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Raw HTTP outcome: status plus the full body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Cheap-to-clone handle on the HTTP client and its fixed settings.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    api_key: Secret,
}

impl Transport {
    /// Build a transport from client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, OktoError> {
        Self::with_timeout(
            config.resolved_base_url()?,
            config.api_key.clone(),
            config.request_timeout(),
        )
    }

    pub fn with_timeout(base_url: Url, api_key: Secret, timeout: Duration) -> Result<Self, OktoError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OktoError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a path such as `/api/v1/portfolio`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Start a request carrying the API key and JSON `accept` header.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(API_KEY_HEADER, self.api_key.expose())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
    }

    /// Send a request and read the body.
    ///
    /// Failing to get a response or to read its body is a
    /// [`OktoError::NetworkError`]. HTTP error statuses are *not* mapped here;
    /// see [`RawResponse::error_for_status`].
    pub async fn send(&self, request: RequestBuilder) -> Result<RawResponse, OktoError> {
        let response = request
            .send()
            .await
            .map_err(|source| OktoError::NetworkError { source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| OktoError::NetworkError { source })?;

        Ok(RawResponse { status, body })
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key)
            .finish()
    }
}

impl RawResponse {
    /// Map 4xx/5xx to [`OktoError::HttpError`].
    pub fn error_for_status(self) -> Result<Self, OktoError> {
        if self.status.is_client_error() || self.status.is_server_error() {
            return Err(OktoError::HttpError {
                status: self.status.as_u16(),
                body: self.body,
            });
        }
        Ok(self)
    }

    /// Decode the envelope, checking its status before touching `data`.
    pub fn into_envelope<T: DeserializeOwned>(self) -> Result<ApiEnvelope<T>, OktoError> {
        decode_envelope(&self.body)
    }
}

/// Envelope with `data` left undecoded.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

/// Decode `{status, data}`; a non-success status wins over any shape problem
/// in `data`.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<ApiEnvelope<T>, OktoError> {
    let raw: RawEnvelope = serde_json::from_str(body).map_err(|e| OktoError::Decode {
        message: format!("invalid response envelope: {}", e),
        body: body.to_string(),
    })?;

    // A missing or null status is an application failure, not a shape error.
    let Some(status) = raw
        .status
        .filter(|status| status == crate::model::STATUS_SUCCESS)
    else {
        return Err(OktoError::ApplicationError {
            raw_body: body.to_string(),
        });
    };

    let data = serde_json::from_value(raw.data).map_err(|e| OktoError::Decode {
        message: format!("unexpected response data: {}", e),
        body: body.to_string(),
    })?;

    Ok(ApiEnvelope { status, data })
}
