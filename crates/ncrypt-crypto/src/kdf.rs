// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 master key derivation from a password.
//!
//! The salt is an application-wide constant so that the same password
//! reproduces the same master key on any device without the server storing a
//! per-user salt. Two users with the same password therefore share a master key.
//!
//! Right after derivation the fixed string `master-key-verification` is sealed
//! under the new key. The resulting artifact lets later code confirm that a
//! bundle still matches its key without the password.

use std::num::NonZeroU32;

use ncrypt_core::NcryptError;
use ring::pbkdf2;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN, SymmetricKey};
use crate::envelope::EncryptedEnvelope;

/// PBKDF2 iteration count used in production.
pub const KDF_ITERATIONS: u32 = 100_000;

const DEFAULT_ITERATIONS: NonZeroU32 = match NonZeroU32::new(KDF_ITERATIONS) {
    Some(n) => n,
    None => panic!("KDF_ITERATIONS must be non-zero"),
};

/// Application-wide PBKDF2 salt.
// TODO: revisit once per-user salts can be served before login without breaking existing keys.
pub const KDF_SALT: &[u8] = b"ncrypt-master-key-salt";

/// Known plaintext sealed into every bundle's verification artifact.
pub const VERIFICATION_PLAINTEXT: &[u8] = b"master-key-verification";

/// PBKDF2 parameters.
///
/// Production code uses [`KdfParams::default`]. Other values exist so tests can
/// run with a cheap iteration count; keys derived with them are not
/// interchangeable with production keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    pub iterations: NonZeroU32,
    pub salt: Vec<u8>,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            salt: KDF_SALT.to_vec(),
        }
    }
}

impl KdfParams {
    /// Default salt with a custom iteration count.
    pub fn with_iterations(iterations: u32) -> Result<Self, NcryptError> {
        let iterations = NonZeroU32::new(iterations).ok_or_else(|| {
            NcryptError::KeyDerivationFailed("iteration count must be non-zero".to_string())
        })?;
        Ok(Self {
            iterations,
            salt: KDF_SALT.to_vec(),
        })
    }
}

/// A derived master key with its self-check artifact.
///
/// Lives only in session memory: it implements neither `Serialize` nor an
/// accessor for the raw key bytes, and its `Debug` output omits the key.
pub struct MasterKeyBundle {
    verification: EncryptedEnvelope,
    key: SymmetricKey,
}

impl MasterKeyBundle {
    /// Usable master key.
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    /// The sealed `master-key-verification` string.
    pub fn verification(&self) -> &EncryptedEnvelope {
        &self.verification
    }

    pub fn verification_ciphertext(&self) -> &[u8] {
        self.verification.ciphertext()
    }

    pub fn nonce(&self) -> &[u8; crypto::NONCE_LEN] {
        self.verification.nonce()
    }

    /// Confirm that the verification artifact opens under the bundle's key.
    pub fn verify(&self) -> Result<(), NcryptError> {
        verify_artifact(&self.verification, &self.key)
    }

    /// Whether this bundle holds the same key as `other`.
    ///
    /// Checked by opening `other`'s artifact with this bundle's key, so no key
    /// bytes are compared directly.
    pub fn same_key_as(&self, other: &MasterKeyBundle) -> bool {
        verify_artifact(&other.verification, &self.key).is_ok()
    }
}

impl std::fmt::Debug for MasterKeyBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyBundle")
            .field("verification", &self.verification)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Check a verification artifact against a key.
///
/// Fails with [`NcryptError::KeyDerivationFailed`] if the artifact does not
/// open to the known verification string.
pub fn verify_artifact(artifact: &EncryptedEnvelope, key: &SymmetricKey) -> Result<(), NcryptError> {
    let plaintext = crypto::open(key, artifact).map_err(|_| {
        NcryptError::KeyDerivationFailed("verification artifact does not match key".to_string())
    })?;
    if plaintext.as_slice() != VERIFICATION_PLAINTEXT {
        return Err(NcryptError::KeyDerivationFailed(
            "verification artifact holds an unexpected value".to_string(),
        ));
    }
    Ok(())
}

/// Derive a master key bundle with production parameters (blocking).
pub fn derive_master_key(password: &SecretString) -> Result<MasterKeyBundle, NcryptError> {
    derive_master_key_with(password, &KdfParams::default())
}

/// Derive a master key bundle with explicit parameters (blocking).
pub fn derive_master_key_with(
    password: &SecretString,
    params: &KdfParams,
) -> Result<MasterKeyBundle, NcryptError> {
    let password = password.expose_secret();
    if password.is_empty() {
        return Err(NcryptError::KeyDerivationFailed(
            "empty password not allowed".to_string(),
        ));
    }

    let mut derived = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        params.iterations,
        &params.salt,
        password.as_bytes(),
        &mut derived[..],
    );
    let key = SymmetricKey::from_array(*derived);

    let verification = crypto::seal(&key, VERIFICATION_PLAINTEXT)
        .map_err(|e| NcryptError::KeyDerivationFailed(format!("verification encryption: {e}")))?;

    debug!(iterations = params.iterations.get(), "master key derived");
    Ok(MasterKeyBundle { verification, key })
}

/// Derive a master key bundle with production parameters.
///
/// The stretching runs on the blocking pool so the async scheduler is never
/// held for the duration of 100,000 iterations.
pub async fn derive(password: SecretString) -> Result<MasterKeyBundle, NcryptError> {
    derive_with(password, KdfParams::default()).await
}

/// Async variant of [`derive_master_key_with`].
pub async fn derive_with(
    password: SecretString,
    params: KdfParams,
) -> Result<MasterKeyBundle, NcryptError> {
    tokio::task::spawn_blocking(move || derive_master_key_with(&password, &params))
        .await
        .map_err(|e| NcryptError::KeyDerivationFailed(format!("derivation task failed: {e}")))?
}
