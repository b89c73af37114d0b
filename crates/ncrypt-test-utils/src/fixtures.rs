// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire-form fixtures.
//!
//! Secret resources are built as raw JSON, exactly as the server would return
//! them, so client tests exercise the same parsing path as production.

use ncrypt_crypto::{KdfParams, MasterKeyBundle, SymmetricKey, derive_master_key_with, seal};
use secrecy::SecretString;
use serde_json::{Value, json};

/// Iteration count used by tests instead of the production 100,000.
pub const TEST_KDF_ITERATIONS: u32 = 1_000;

/// Cheap KDF parameters. Keys derived with these are test-only.
pub fn test_kdf_params() -> KdfParams {
    KdfParams::with_iterations(TEST_KDF_ITERATIONS)
        .unwrap_or_else(|e| panic!("test KDF parameters rejected: {e}"))
}

/// Derive a bundle for `password` with [`test_kdf_params`].
///
/// Panics on failure; fixtures are only used from tests.
pub fn test_bundle(password: &str) -> MasterKeyBundle {
    derive_master_key_with(&SecretString::from(password.to_string()), &test_kdf_params())
        .unwrap_or_else(|e| panic!("test bundle derivation failed: {e}"))
}

/// A secret resource whose payload is sealed under `key`.
pub fn secret_json(
    id: i64,
    title: &str,
    key: &SymmetricKey,
    password: &str,
    description: &str,
) -> Value {
    let payload = json!({ "password": password, "description": description }).to_string();
    let envelope = seal(key, payload.as_bytes())
        .and_then(|env| env.to_json_string())
        .unwrap_or_else(|e| panic!("fixture encryption failed: {e}"));
    resource(id, title, envelope)
}

/// A secret resource whose envelope fails authentication under any key.
pub fn corrupted_secret_json(id: i64, title: &str) -> Value {
    // 16 zero bytes: a well-formed tag that will never verify.
    let envelope = json!({
        "encrypted": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        "iv": "AAAAAAAAAAAAAAAA",
    })
    .to_string();
    resource(id, title, envelope)
}

fn resource(id: i64, title: &str, client_encrypted_data: String) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "Encrypted",
        "client_encrypted_data": client_encrypted_data,
        "is_password": true,
        "created_by_user_id": 1,
        "created_at": "2026-01-15T10:00:00",
        "updated_at": null,
        "is_shared": false,
        "share_with_all": false,
        "role_shares": [],
    })
}
