//! HTTP client for the upstream REST API.
//!
//! `ApiClient` is used two ways: gateway handlers call [`ApiClient::send`] with the
//! caller's token to relay requests upstream, and the client library uses the typed
//! trait impls in `client::api` against the gateway's `/api` surface.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::AppError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("view-gateway/", env!("CARGO_PKG_VERSION"));

/// Status and (optional) JSON body of an upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The `message` or `error` field of an error body.
    pub fn error_message(&self) -> Option<String> {
        let body = self.body.as_ref()?;
        ["message", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }

    /// Turn a non-2xx answer into an error, using `fallback` when the body has no message.
    pub fn error_for_status(self, fallback: &str) -> Result<Self, AppError> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self
            .error_message()
            .unwrap_or_else(|| fallback.to_string());
        Err(AppError::Upstream {
            status: self.status.as_u16(),
            message,
        })
    }

    /// Decode a successful body.
    pub fn json<T: DeserializeOwned>(self, fallback: &str) -> Result<T, AppError> {
        let resp = self.error_for_status(fallback)?;
        let body = resp.body.unwrap_or(Value::Null);
        serde_json::from_value(body).map_err(|e| {
            tracing::error!("Unexpected upstream body: {}", e);
            AppError::Internal(format!("{}: unexpected response", fallback))
        })
    }

    /// Relay to the browser: success bodies pass through unchanged (with `success_status`
    /// when given), errors become `{ error }` with the upstream status.
    pub fn relay(self, success_status: Option<StatusCode>, fallback: &str) -> Response {
        match self.error_for_status(fallback) {
            Ok(resp) => {
                let status = success_status.unwrap_or(resp.status);
                match resp.body {
                    Some(body) if status != StatusCode::NO_CONTENT => {
                        (status, Json(body)).into_response()
                    }
                    _ => status.into_response(),
                }
            }
            Err(e) => e.into_response(),
        }
    }
}

/// Client for the upstream API (or the gateway, when used by the client library).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Client-library client: keeps the session cookie the gateway sets.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Self::build(base_url, DEFAULT_TIMEOUT, true)
    }

    /// Gateway client shared by all callers. It holds no cookie store, so nothing one
    /// caller's upstream answer sets is replayed on another caller's request.
    pub fn stateless(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Self::build(base_url, timeout, false)
    }

    fn build(base_url: &str, timeout: Duration, cookie_store: bool) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(cookie_store)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self::from_client(http, base_url))
    }

    pub fn from_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// A copy of this client that sends `token` as a bearer credential.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue one request and collect the status and JSON body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<UpstreamResponse, AppError> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request.send().await?;
        let status = StatusCode::from_u16(resp.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = resp.bytes().await?;

        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Non-JSON body from {} ({}): {}", url, status, e);
                    None
                }
            }
        };

        if !status.is_success() {
            tracing::warn!("Upstream {} answered {}", url, status);
        }

        Ok(UpstreamResponse { status, body })
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<UpstreamResponse, AppError> {
        self.send(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<UpstreamResponse, AppError> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<UpstreamResponse, AppError> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<UpstreamResponse, AppError> {
        self.send(Method::DELETE, path, &[], None).await
    }
}
