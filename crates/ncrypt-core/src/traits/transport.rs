// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport collaborator trait for the vault HTTP API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::NcryptError;
use crate::types::AuthToken;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Request body variants understood by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` pairs (used by the OAuth2 login form).
    Form(Vec<(String, String)>),
}

/// An opaque request handed to the transport.
///
/// `path` is relative to the configured API base, e.g. `/secrets/12/share`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    /// Bearer token to attach; `None` for unauthenticated endpoints.
    pub auth: Option<AuthToken>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            auth: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(pairs);
        self
    }

    pub fn bearer(mut self, token: AuthToken) -> Self {
        self.auth = Some(token);
        self
    }
}

/// A successful (2xx) response. Non-success statuses are reported as
/// [`NcryptError::Api`] by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` for empty bodies (e.g. 204).
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn ok(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`NcryptError::Api`].
    ///
    /// The detail comes from the server's `{"detail": ...}` body when present.
    pub fn error_for_status(self) -> Result<Self, NcryptError> {
        if self.is_success() {
            return Ok(self);
        }
        let detail = match self.body.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "API Error".to_string(),
        };
        Err(NcryptError::Api {
            status: self.status,
            detail,
        })
    }

    /// Deserialize the body into a typed response.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, NcryptError> {
        serde_json::from_value(self.body).map_err(NcryptError::from)
    }
}

/// Opaque send/receive collaborator for the vault API.
///
/// Implementations must not retry: retries, if desired, are a transport-level
/// policy decided by the embedding application.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends one request and returns its successful response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, NcryptError>;
}
