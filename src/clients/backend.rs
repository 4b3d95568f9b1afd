//! HTTP boundary to the POS backend.
//!
//! Everything that crosses the wire goes through the [`Transport`] trait
//! so the session and dashboard layers can be exercised against a canned
//! transport in tests. [`HttpTransport`] is the reqwest implementation;
//! timeouts are left to reqwest's defaults.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::PendingDeviceApproval;

/// Structured error code the backend returns on a device-restricted login.
pub const DEVICE_RESTRICTED_CODE: &str = "DEVICE_NOT_APPROVED";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("session is no longer valid")]
    Unauthorized,

    #[error("device awaiting admin approval")]
    DevicePending(PendingDeviceApproval),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("session store error: {0}")]
    Store(String),

    #[error("invalid base URL: {0}")]
    BadUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,

    /// Path relative to the API base, e.g. `auth/login`.
    pub path: String,

    pub body: Option<Value>,

    pub token: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            body: None,
            token: None,
        }
    }

    #[must_use]
    pub fn post(path: &str, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.to_string(),
            body: Some(body),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// Raw status + JSON body; classification happens above the transport.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,

    pub body: Value,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, req: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        // reqwest's Url::join treats a base without a trailing slash as a
        // file component and would drop the `/api` prefix.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("AquaDesk/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: Url::parse(&normalized)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, req: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.base_url.join(req.path.trim_start_matches('/'))?;

        let mut builder = self.client.request(req.method.clone(), url);
        if let Some(token) = &req.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        // Empty or non-JSON bodies degrade to Null rather than failing;
        // the classifier decides what that means per status.
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        debug!(method = %req.method, path = %req.path, status, "api call");
        Ok(ApiResponse { status, body })
    }
}

/// Pulls the payload out of the backend's response envelope: a `data`
/// key when present, otherwise the body itself.
#[must_use]
pub fn unwrap_data(body: &Value) -> Value {
    body.get("data").cloned().unwrap_or_else(|| body.clone())
}

/// List payloads arrive either as a bare array or wrapped under a
/// collection key; either way the entries come back as a vec.
#[must_use]
pub fn list_entries(data: &Value) -> Vec<Value> {
    if let Some(entries) = data.as_array() {
        return entries.clone();
    }
    for key in ["records", "items", "rows", "requests", "results"] {
        if let Some(entries) = data.get(key).and_then(Value::as_array) {
            return entries.clone();
        }
    }
    Vec::new()
}

/// Best-effort human message from an error body.
#[must_use]
pub fn error_message(body: &Value) -> String {
    for key in ["message", "error", "detail"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            return msg.to_string();
        }
    }
    "request failed".to_string()
}

/// Whether an error body is the device-restriction signal.
///
/// The structured code is authoritative. Matching the word "device" in
/// the message is a deprecated fallback for older backend builds and
/// warns when it fires.
#[must_use]
pub fn is_device_restricted(body: &Value) -> bool {
    if body
        .get("code")
        .and_then(Value::as_str)
        .is_some_and(|c| c == DEVICE_RESTRICTED_CODE)
    {
        return true;
    }

    let by_message = body
        .get("message")
        .and_then(Value::as_str)
        .is_some_and(|m| m.to_ascii_lowercase().contains("device"));
    if by_message {
        warn!("device restriction detected by message text; backend should send code=DEVICE_NOT_APPROVED");
    }
    by_message
}

/// Maps a non-auth response to the error taxonomy. 401 is deliberately
/// not handled here; the session manager owns that side effect.
pub fn classify(response: &ApiResponse) -> Result<Value, ApiError> {
    let status = StatusCode::from_u16(response.status)
        .map_err(|_| ApiError::UnexpectedShape(format!("status {}", response.status)))?;

    if status.is_success() {
        return Ok(unwrap_data(&response.body));
    }

    Err(ApiError::Rejected {
        status: response.status,
        message: error_message(&response.body),
    })
}
