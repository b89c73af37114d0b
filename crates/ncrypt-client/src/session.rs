// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session state: the master key custody and the bearer token.
//!
//! Both live only in memory. A `Session` is owned by one [`VaultClient`]
//! (behind an `Arc`) and passed by reference to whatever needs it.
//!
//! [`VaultClient`]: crate::VaultClient

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use ncrypt_core::{AuthToken, NcryptError, RoleLevel};
use ncrypt_crypto::{MasterKeyBundle, SessionKeyCustody};
use tracing::debug;

use crate::auth::Identity;

#[derive(Debug, Default)]
pub struct Session {
    custody: SessionKeyCustody,
    token: ArcSwapOption<AuthToken>,
    identity: ArcSwapOption<Identity>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custody(&self) -> &SessionKeyCustody {
        &self.custody
    }

    /// The resident master key, or [`NcryptError::MissingMasterKey`].
    pub fn master_key(&self) -> Result<Arc<MasterKeyBundle>, NcryptError> {
        self.custody.get()
    }

    /// The bearer token, or [`NcryptError::Unauthenticated`].
    pub fn token(&self) -> Result<AuthToken, NcryptError> {
        self.token
            .load_full()
            .map(|t| (*t).clone())
            .ok_or(NcryptError::Unauthenticated)
    }

    pub fn set_token(&self, token: AuthToken) {
        self.token.store(Some(Arc::new(token)));
    }

    /// Drop the bearer token but keep the master key.
    pub fn clear_token(&self) {
        if self.token.swap(None).is_some() {
            debug!("bearer token cleared");
        }
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.identity.load_full()
    }

    pub(crate) fn set_identity(&self, identity: Identity) {
        self.identity.store(Some(Arc::new(identity)));
    }

    /// Role level of the signed-in member, if the server reported one.
    pub fn role_level(&self) -> Option<RoleLevel> {
        self.identity.load().as_ref().and_then(|i| i.role_level)
    }

    /// Whether both a master key and a bearer token are present.
    pub fn is_active(&self) -> bool {
        self.custody.is_present() && self.token.load().is_some()
    }

    /// Forget everything: key, token and identity.
    pub fn clear(&self) {
        self.custody.clear();
        self.clear_token();
        self.identity.store(None);
    }
}
