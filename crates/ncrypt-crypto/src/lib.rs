// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side cryptography for the ncrypt secrets vault.
//!
//! Secret payloads are sealed with AES-256-GCM under a master key that is
//! derived from the user's password with PBKDF2-HMAC-SHA256 and held only in
//! memory for the lifetime of a session. The server only ever sees
//! [`EncryptedEnvelope`]s.
//!
//! - [`crypto`]: seal/open and key generation
//! - [`envelope`]: the `{encrypted, iv}` wire form
//! - [`kdf`]: password to [`MasterKeyBundle`]
//! - [`custody`]: the session-scoped key holder with fail-closed guards
//! - [`group`]: per-member wrapping of a shared group key

pub mod crypto;
pub mod custody;
pub mod envelope;
pub mod group;
pub mod kdf;

pub use crypto::{ExportedKey, Sealed, SymmetricKey, decrypt, encrypt, generate_key, open, seal};
pub use custody::{CustodyGuard, SessionKeyCustody};
pub use envelope::{EncryptedEnvelope, WireEnvelope};
pub use group::{GeneratedGroupKey, GroupKey, GroupKeyGrant, GroupKeyring};
pub use kdf::{
    KdfParams, MasterKeyBundle, derive, derive_master_key, derive_master_key_with, derive_with,
    verify_artifact,
};
