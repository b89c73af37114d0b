// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication flows.
//!
//! Each flow derives the master key from the password locally. The server
//! only ever receives the SHA-256 hex digest of the password.
//!
//! Flows are fail-closed: a flow that errors, or whose future is dropped
//! before it completes, leaves no master key in custody.

use ncrypt_core::{ApiRequest, AuthToken, NcryptError, RoleLevel};
use ncrypt_crypto::{MasterKeyBundle, derive_with};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::client::VaultClient;

/// The signed-in member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub role_level: Option<RoleLevel>,
}

/// Response of `GET /users/check-owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OwnerStatus {
    pub owner_exists: bool,
    #[serde(default)]
    pub setup_required: bool,
}

#[derive(Deserialize)]
struct RegisteredUser {
    email: String,
    role_level: Option<RoleLevel>,
}

/// Lowercase hex SHA-256 of the password, the only form the server sees.
pub fn hash_password(password: &SecretString) -> String {
    hex::encode(Sha256::digest(password.expose_secret().as_bytes()))
}

impl VaultClient {
    /// Sign in and install the master key for the session.
    pub async fn login(&self, email: &str, password: SecretString) -> Result<Identity, NcryptError> {
        self.session.clear();
        let hashed = hash_password(&password);
        let bundle = self.derive(password).await?;

        let guard = self.session.custody().acquire(bundle);
        let token = self.request_token(email, &hashed).await?;
        self.session.set_token(token);
        guard.commit();

        let identity = Identity {
            email: email.to_string(),
            role_level: None,
        };
        self.session.set_identity(identity.clone());
        info!("signed in");
        Ok(identity)
    }

    /// Register the first user (the owner) and sign in.
    ///
    /// The key enters custody only once registration and sign-in both succeed.
    pub async fn setup_owner(
        &self,
        email: &str,
        password: SecretString,
        first_name: &str,
        last_name: &str,
    ) -> Result<Identity, NcryptError> {
        self.session.clear();
        let hashed = hash_password(&password);
        let bundle = self.derive(password).await?;

        let registered: RegisteredUser = self
            .send(ApiRequest::post("/users/register-first-user").json(json!({
                "email": email,
                "password": hashed,
                "first_name": first_name,
                "last_name": last_name,
            })))
            .await?
            .parse()?;

        let token = self.request_token(&registered.email, &hashed).await?;
        self.session.custody().set(bundle);
        self.session.set_token(token);

        let identity = Identity {
            email: registered.email,
            role_level: registered.role_level,
        };
        self.session.set_identity(identity.clone());
        info!("owner account created");
        Ok(identity)
    }

    /// Accept an invitation, set the member's password, and sign in.
    pub async fn accept_invite(
        &self,
        invite_token: &str,
        password: SecretString,
    ) -> Result<Identity, NcryptError> {
        self.session.clear();
        let hashed = hash_password(&password);
        let bundle = self.derive(password).await?;

        let guard = self.session.custody().acquire(bundle);
        let accepted: RegisteredUser = self
            .send(ApiRequest::post("/users/accept-invite").json(json!({
                "token": invite_token,
                "password": hashed,
            })))
            .await?
            .parse()?;

        let token = self.request_token(&accepted.email, &hashed).await?;
        self.session.set_token(token);
        guard.commit();

        let identity = Identity {
            email: accepted.email,
            role_level: accepted.role_level,
        };
        self.session.set_identity(identity.clone());
        info!("invitation accepted");
        Ok(identity)
    }

    /// End the session. Local state is cleared before the server is told, and
    /// stays cleared if telling the server fails.
    pub async fn logout(&self) {
        let token = self.session.token().ok();
        self.session.clear();

        if let Some(token) = token
            && let Err(e) = self.send(ApiRequest::post("/auth/logout").bearer(token)).await
        {
            warn!(error = %e, "logout request failed; local session already cleared");
        }
        info!("signed out");
    }

    /// Whether the vault already has an owner.
    pub async fn check_owner(&self) -> Result<OwnerStatus, NcryptError> {
        self.send(ApiRequest::get("/users/check-owner"))
            .await?
            .parse()
    }

    async fn derive(&self, password: SecretString) -> Result<MasterKeyBundle, NcryptError> {
        derive_with(password, self.kdf.clone()).await.inspect_err(|e| {
            warn!(error = %e, "master key derivation failed");
        })
    }

    async fn request_token(&self, email: &str, hashed: &str) -> Result<AuthToken, NcryptError> {
        self.send(ApiRequest::post("/auth/login").form(vec![
            ("username".to_string(), email.to_string()),
            ("password".to_string(), hashed.to_string()),
        ]))
        .await?
        .parse()
    }
}
