// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The vault client: a transport, a session, and the decode settings.
//!
//! Authentication flows live in [`crate::auth`], secret operations in
//! [`crate::secrets`]; both are `impl VaultClient` blocks.

use std::sync::Arc;

use ncrypt_config::NcryptConfig;
use ncrypt_core::{ApiRequest, ApiResponse, ApiTransport, NcryptError};
use ncrypt_crypto::KdfParams;
use tracing::warn;

use crate::http::HttpTransport;
use crate::session::Session;

pub struct VaultClient {
    pub(crate) transport: Arc<dyn ApiTransport>,
    pub(crate) session: Arc<Session>,
    pub(crate) kdf: KdfParams,
    pub(crate) decode_concurrency: usize,
}

impl VaultClient {
    /// Client over `transport` with production key derivation.
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            session: Arc::new(Session::new()),
            kdf: KdfParams::default(),
            decode_concurrency: ncrypt_config::model::SecretsConfig::default().decode_concurrency,
        }
    }

    /// Client over HTTP, configured from `config`.
    pub fn from_config(config: &NcryptConfig) -> Result<Self, NcryptError> {
        let transport = HttpTransport::from_config(&config.api)?;
        Ok(Self::new(Arc::new(transport))
            .with_decode_concurrency(config.secrets.decode_concurrency))
    }

    /// Override the KDF parameters.
    ///
    /// Keys derived with non-default parameters do not match keys derived
    /// anywhere else; this exists for tests.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf = params;
        self
    }

    pub fn with_decode_concurrency(mut self, concurrency: usize) -> Self {
        self.decode_concurrency = concurrency.max(1);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send without credentials.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse, NcryptError> {
        self.transport
            .send(request)
            .await
            .and_then(ApiResponse::error_for_status)
    }

    /// Send with the session's bearer token. A 401 drops the token.
    pub(crate) async fn send_authed(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, NcryptError> {
        let token = self.session.token()?;
        match self.send(request.bearer(token)).await {
            Err(err @ NcryptError::Api { status: 401, .. }) => {
                warn!("server rejected bearer token; clearing it");
                self.session.clear_token();
                Err(err)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("session", &self.session)
            .field("kdf_iterations", &self.kdf.iterations)
            .field("decode_concurrency", &self.decode_concurrency)
            .finish_non_exhaustive()
    }
}
