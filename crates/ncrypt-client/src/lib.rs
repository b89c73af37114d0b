// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault client for ncrypt.
//!
//! Everything secret-bearing is sealed here before it reaches an
//! [`ApiTransport`](ncrypt_core::ApiTransport) and opened here after it comes
//! back. The server only stores envelopes, titles and sharing metadata.
//!
//! - [`codec`]: secret payload encode/decode with per-record failure isolation
//! - [`sharing`]: who may read a shared secret
//! - [`team`]: team members and invitations
//! - [`VaultClient`]: authentication flows and the secrets API
//! - [`http`]: the reqwest-backed transport

pub mod auth;
pub mod client;
pub mod codec;
pub mod http;
pub mod records;
pub mod secrets;
pub mod session;
pub mod sharing;
pub mod team;
pub mod telemetry;

pub use auth::{Identity, OwnerStatus, hash_password};
pub use client::VaultClient;
pub use codec::{DecodeFailure, DecodeResult, DecodedSecret, FailedRecord, SecretPayload};
pub use http::HttpTransport;
pub use records::{
    CreateSecretRequest, DECRYPTION_FAILED_DESCRIPTION, DECRYPTION_FAILED_PASSWORD, RoleShare,
    SecretResource,
};
pub use session::Session;
pub use sharing::{ShareRequest, SharingPolicy, SharingState, display_order, selectable_levels};
pub use team::{
    Invitation, InviteRequest, InvitedUser, PendingInvite, TeamMember, TeamMemberUpdate,
};
