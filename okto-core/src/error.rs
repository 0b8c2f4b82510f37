//! Top-level error types for the Okto client.

use thiserror::Error;

use crate::store::StoreError;

/// Top-level error type encompassing every failure the client can surface.
#[derive(Debug, Error)]
pub enum OktoError {
    /// The request never produced an HTTP response (DNS, connect, timeout, reset).
    ///
    /// Always safe for the caller to retry. The executor itself never does.
    #[error("network error: {source}")]
    NetworkError {
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a client or server error status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The server answered 2xx but the envelope status was not `success`.
    #[error("server responded with an error: {raw_body}")]
    ApplicationError { raw_body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response: {message}")]
    Decode { message: String, body: String },

    /// Exchanging an identity token for a session failed.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The session could not be refreshed; the caller must re-authenticate.
    #[error("session refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The poll budget ran out before the job reached a terminal status.
    #[error("job {job_id} did not settle after {attempts} attempts")]
    JobTimeout { job_id: String, attempts: u32 },

    /// A token triple was only partially populated.
    #[error("invalid session: {message}")]
    InvalidSession { message: String },

    /// Error from credential storage.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl OktoError {
    /// Whether retrying the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError { .. } => true,
            Self::HttpError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the caller has to obtain a fresh session before trying again.
    pub fn requires_reauthentication(&self) -> bool {
        match self {
            Self::AuthenticationFailed { .. } | Self::RefreshFailed { .. } => true,
            Self::HttpError { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            Self::NetworkError { source } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = OktoError> = std::result::Result<T, E>;
