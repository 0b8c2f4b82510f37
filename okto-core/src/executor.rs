//! Authenticated request execution.
//!
//! [`RequestExecutor`] issues GET/POST calls under `{base}/api`, attaches the
//! session's bearer token, and classifies the outcome:
//!
//! | outcome                                   | result                          |
//! |-------------------------------------------|---------------------------------|
//! | no response (DNS, connect, timeout, reset) | [`OktoError::NetworkError`]     |
//! | HTTP 4xx/5xx                              | [`OktoError::HttpError`]        |
//! | body is not an envelope / wrong shape     | [`OktoError::Decode`]           |
//! | envelope `status != "success"`            | [`OktoError::ApplicationError`] |
//! | otherwise                                 | `Ok(ApiEnvelope<T>)`            |
//!
//! The executor never retries and never touches the session. A logged-out
//! client still sends its requests, with an empty bearer token.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::OktoError;
use crate::model::ApiEnvelope;
use crate::query::QueryParams;
use crate::session_manager::SessionManager;
use crate::transport::Transport;

/// Prefix shared by every data endpoint.
pub const API_PREFIX: &str = "/api";

#[derive(Debug, Clone)]
pub struct RequestExecutor {
    transport: Transport,
    session: Arc<SessionManager>,
}

impl RequestExecutor {
    pub fn new(transport: Transport, session: Arc<SessionManager>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    /// GET `{base}/api{path}`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>, OktoError> {
        let request = self.authorized(Method::GET, path);
        self.execute(Method::GET, path, request).await
    }

    /// GET `{base}/api{path}?{query}`; empty query fields are omitted.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<ApiEnvelope<T>, OktoError>
    where
        T: DeserializeOwned,
        Q: QueryParams + ?Sized,
    {
        let path = query_path(path, query);
        self.get(&path).await
    }

    /// POST `{base}/api{path}` without a body.
    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>, OktoError> {
        let request = self
            .authorized(Method::POST, path)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        self.execute(Method::POST, path, request).await
    }

    /// POST `{base}/api{path}` with a JSON body.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<ApiEnvelope<T>, OktoError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.authorized(Method::POST, path).json(body);
        self.execute(Method::POST, path, request).await
    }

    fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        let token = self.session.current_auth_token();
        self.transport
            .request(method, &format!("{}{}", API_PREFIX, path))
            .header(AUTHORIZATION, format!("Bearer {}", token.expose()))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, OktoError> {
        tracing::debug!("{} {}{}", method, API_PREFIX, path);

        let result = self
            .transport
            .send(request)
            .await
            .and_then(|raw| raw.error_for_status())
            .and_then(|raw| raw.into_envelope());

        if let Err(e) = &result {
            tracing::debug!("{} {}{} failed: {}", method, API_PREFIX, path, e);
        }
        result
    }
}

/// Append a rendered query to a path.
pub fn query_path<Q: QueryParams + ?Sized>(path: &str, query: &Q) -> String {
    let mut rendered = crate::query::QueryString::new();
    query.write_query(&mut rendered);
    rendered.append_to(path)
}
