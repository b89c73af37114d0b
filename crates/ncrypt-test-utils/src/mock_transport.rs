// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock API transport for deterministic testing.
//!
//! `MockTransport` implements `ApiTransport` with replies scripted per
//! `(method, path)` and captures every request it receives, so tests can
//! assert both what was sent and that nothing was sent at all.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use ncrypt_core::{ApiRequest, ApiResponse, ApiTransport, Method, NcryptError};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::debug;

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// An HTTP response; non-2xx statuses become `NcryptError::Api`.
    Response(ApiResponse),
    /// A network failure before any response arrived.
    TransportError(String),
    /// Never completes. Used to test cancellation.
    Hang,
}

type Route = (Method, String);

/// A mock vault API for testing.
///
/// Each route holds a queue of replies. Replies are consumed in order; the
/// last one is sticky and answers every further call. Unscripted routes
/// answer `404 {"detail": "Not Found"}`.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<Route, VecDeque<MockReply>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`.
    pub async fn push(&self, method: Method, path: &str, reply: MockReply) {
        self.routes
            .lock()
            .await
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Queue a response with `status` and JSON `body`.
    pub async fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, MockReply::Response(ApiResponse { status, body }))
            .await;
    }

    /// Queue a `200 OK` with JSON `body`.
    pub async fn ok(&self, method: Method, path: &str, body: Value) {
        self.respond(method, path, 200, body).await;
    }

    /// Queue an error response shaped like the server's `{"detail": ...}`.
    pub async fn fail(&self, method: Method, path: &str, status: u16, detail: &str) {
        self.respond(method, path, status, json!({ "detail": detail }))
            .await;
    }

    /// All requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Requests received for one route.
    pub async fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    async fn next_reply(&self, method: Method, path: &str) -> MockReply {
        let mut routes = self.routes.lock().await;
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(MockReply::Hang),
            Some(queue) => queue.front().cloned().unwrap_or(MockReply::Hang),
            None => MockReply::Response(ApiResponse {
                status: 404,
                body: json!({ "detail": "Not Found" }),
            }),
        }
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, NcryptError> {
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, "mock transport received request");
        self.requests.lock().await.push(request);

        match self.next_reply(method, &path).await {
            MockReply::Response(response) => response.error_for_status(),
            MockReply::TransportError(message) => Err(NcryptError::Transport {
                message,
                source: None,
            }),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
