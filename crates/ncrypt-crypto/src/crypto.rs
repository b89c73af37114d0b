// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations.
//!
//! Every call to [`seal`] generates a fresh random 96-bit nonce via the system
//! CSPRNG. Nonce reuse would be catastrophic for GCM security.
//!
//! Key material is only ever handed back to a caller on the fresh-key path
//! ([`generate_key`], or [`encrypt`] without a key). Keys imported with
//! [`SymmetricKey::from_bytes`] cannot be exported again.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ncrypt_core::NcryptError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretBox, SecretString};
use zeroize::Zeroizing;

use crate::envelope::EncryptedEnvelope;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A 256-bit AES-GCM key held in zeroizing memory.
///
/// There is deliberately no accessor that returns the raw bytes.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl SymmetricKey {
    /// Import a key from raw bytes. The imported key is not exportable.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NcryptError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            NcryptError::Codec(format!("key must be {KEY_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self {
            bytes: Zeroizing::new(bytes),
        })
    }

    /// Import a key from its standard base64 encoding.
    pub fn from_base64(encoded: &str) -> Result<Self, NcryptError> {
        let raw = Zeroizing::new(
            STANDARD
                .decode(encoded)
                .map_err(|e| NcryptError::Codec(format!("invalid base64 key: {e}")))?,
        );
        Self::from_bytes(&raw)
    }

    pub(crate) fn from_array(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    #[cfg(test)]
    pub(crate) fn material(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    fn aead_key(&self) -> Result<LessSafeKey, NcryptError> {
        let unbound = UnboundKey::new(&AES_256_GCM, self.bytes.as_ref())
            .map_err(|_| NcryptError::Internal("failed to create AES-256-GCM key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Raw bytes of a freshly generated key, returned exactly once to the caller
/// that generated it.
pub struct ExportedKey {
    bytes: SecretBox<[u8; KEY_LEN]>,
}

impl ExportedKey {
    fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes: SecretBox::new(Box::new(bytes)),
        }
    }

    /// Borrow the raw key bytes.
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        self.bytes.expose_secret()
    }

    /// Standard base64 encoding of the key, as used by the `key` field of the
    /// legacy wire format.
    pub fn to_base64(&self) -> SecretString {
        SecretString::from(STANDARD.encode(self.bytes.expose_secret()))
    }

    /// Turn the exported bytes into a usable (non-exportable) key.
    pub fn to_key(&self) -> SymmetricKey {
        SymmetricKey::from_array(*self.bytes.expose_secret())
    }
}

impl std::fmt::Debug for ExportedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ExportedKey([REDACTED])")
    }
}

/// Result of [`encrypt`]: the envelope, plus the exported key when one was generated.
#[derive(Debug)]
pub struct Sealed {
    pub envelope: EncryptedEnvelope,
    pub exported_key: Option<ExportedKey>,
}

pub(crate) fn random_bytes<const N: usize>(what: &str) -> Result<[u8; N], NcryptError> {
    let rng = SystemRandom::new();
    let mut out = [0u8; N];
    rng.fill(&mut out)
        .map_err(|_| NcryptError::EncryptionFailed(format!("failed to generate random {what}")))?;
    Ok(out)
}

/// Generate a random 32-byte AES-256-GCM key.
///
/// Returns the usable key together with its one-time export.
pub fn generate_key() -> Result<(SymmetricKey, ExportedKey), NcryptError> {
    let bytes = Zeroizing::new(random_bytes::<KEY_LEN>("key")?);
    Ok((SymmetricKey::from_array(*bytes), ExportedKey::new(*bytes)))
}

/// Encrypt plaintext with AES-256-GCM using a random 96-bit nonce.
///
/// The returned envelope carries the ciphertext with the 16-byte tag appended.
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<EncryptedEnvelope, NcryptError> {
    let aead = key
        .aead_key()
        .map_err(|e| NcryptError::EncryptionFailed(e.to_string()))?;

    let nonce_bytes = random_bytes::<NONCE_LEN>("nonce")?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Seal in place: plaintext buffer is extended with the authentication tag.
    let mut in_out = plaintext.to_vec();
    aead.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| NcryptError::EncryptionFailed("AES-256-GCM encryption failed".to_string()))?;

    Ok(EncryptedEnvelope::new(in_out, nonce_bytes))
}

/// Decrypt an envelope with AES-256-GCM.
///
/// Fails with [`NcryptError::DecryptionFailed`] when the tag does not verify.
/// No partial plaintext is ever returned.
pub fn open(
    key: &SymmetricKey,
    envelope: &EncryptedEnvelope,
) -> Result<Zeroizing<Vec<u8>>, NcryptError> {
    let aead = key
        .aead_key()
        .map_err(|e| NcryptError::DecryptionFailed(e.to_string()))?;
    let nonce = Nonce::assume_unique_for_key(*envelope.nonce());

    let mut in_out = Zeroizing::new(envelope.ciphertext().to_vec());
    let plaintext_len = aead
        .open_in_place(nonce, Aad::empty(), in_out.as_mut_slice())
        .map_err(|_| {
            NcryptError::DecryptionFailed("wrong key or corrupted data".to_string())
        })?
        .len();
    in_out.truncate(plaintext_len);

    Ok(in_out)
}

/// Encrypt under `key`, or under a freshly generated key when `key` is `None`.
///
/// Only the fresh-key path returns key material, for new group keys.
pub fn encrypt(plaintext: &[u8], key: Option<&SymmetricKey>) -> Result<Sealed, NcryptError> {
    match key {
        Some(key) => Ok(Sealed {
            envelope: seal(key, plaintext)?,
            exported_key: None,
        }),
        None => {
            let (key, exported) = generate_key()?;
            Ok(Sealed {
                envelope: seal(&key, plaintext)?,
                exported_key: Some(exported),
            })
        }
    }
}

/// Alias of [`open`] named after the engine operation.
pub fn decrypt(
    envelope: &EncryptedEnvelope,
    key: &SymmetricKey,
) -> Result<Zeroizing<Vec<u8>>, NcryptError> {
    open(key, envelope)
}
