// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `{ciphertext, nonce}` envelope and its base64 wire form.
//!
//! On the wire an envelope is `{"encrypted": <base64 ciphertext+tag>, "iv": <base64 nonce>}`.
//! Secret records carry that JSON object serialized into a string field.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ncrypt_core::NcryptError;
use serde::{Deserialize, Serialize};

use crate::crypto::{NONCE_LEN, TAG_LEN};

/// AEAD output: ciphertext with appended tag, plus the nonce used to produce it.
///
/// This is the only secret-bearing value that ever leaves the client. It never
/// carries a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct EncryptedEnvelope {
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_LEN],
}

impl EncryptedEnvelope {
    pub fn new(ciphertext: Vec<u8>, nonce: [u8; NONCE_LEN]) -> Self {
        Self { ciphertext, nonce }
    }

    /// Ciphertext followed by the 16-byte authentication tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Serialize to the JSON string stored in `client_encrypted_data`.
    pub fn to_json_string(&self) -> Result<String, NcryptError> {
        serde_json::to_string(self).map_err(NcryptError::from)
    }

    /// Parse the JSON string stored in `client_encrypted_data`.
    pub fn from_json_str(json: &str) -> Result<Self, NcryptError> {
        serde_json::from_str(json).map_err(NcryptError::from)
    }
}

/// Base64 wire representation of an [`EncryptedEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub encrypted: String,
    pub iv: String,
}

impl From<EncryptedEnvelope> for WireEnvelope {
    fn from(envelope: EncryptedEnvelope) -> Self {
        Self {
            encrypted: STANDARD.encode(&envelope.ciphertext),
            iv: STANDARD.encode(envelope.nonce),
        }
    }
}

impl TryFrom<WireEnvelope> for EncryptedEnvelope {
    type Error = NcryptError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let ciphertext = STANDARD
            .decode(wire.encrypted.as_bytes())
            .map_err(|e| NcryptError::Codec(format!("invalid base64 in `encrypted`: {e}")))?;
        let nonce = STANDARD
            .decode(wire.iv.as_bytes())
            .map_err(|e| NcryptError::Codec(format!("invalid base64 in `iv`: {e}")))?;

        let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|v: Vec<u8>| {
            NcryptError::Codec(format!("nonce must be {NONCE_LEN} bytes, got {}", v.len()))
        })?;
        if ciphertext.len() < TAG_LEN {
            return Err(NcryptError::Codec(format!(
                "ciphertext shorter than the {TAG_LEN}-byte tag"
            )));
        }

        Ok(Self { ciphertext, nonce })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedEnvelope {
        EncryptedEnvelope::new(vec![0xAB; 20], [1u8; NONCE_LEN])
    }

    #[test]
    fn wire_shape_uses_encrypted_and_iv() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("encrypted"));
        assert_eq!(obj["iv"], "AQEBAQEBAQEBAQEB");
    }

    #[test]
    fn json_string_roundtrip() {
        let envelope = sample();
        let s = envelope.to_json_string().unwrap();
        assert_eq!(EncryptedEnvelope::from_json_str(&s).unwrap(), envelope);
    }

    #[test]
    fn short_nonce_is_rejected() {
        let json = r#"{"encrypted":"q6urq6urq6urq6urq6urq6urq6s=","iv":"AQEB"}"#;
        let err = EncryptedEnvelope::from_json_str(json).unwrap_err();
        assert!(matches!(err, NcryptError::Codec(_)));
        assert!(err.to_string().contains("nonce"));
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let json = r#"{"encrypted":"AAAA","iv":"AQEBAQEBAQEBAQEB"}"#;
        assert!(EncryptedEnvelope::from_json_str(json).is_err());
    }

    #[test]
    fn bad_base64_is_rejected() {
        let json = r#"{"encrypted":"***","iv":"AQEBAQEBAQEBAQEB"}"#;
        assert!(matches!(
            EncryptedEnvelope::from_json_str(json),
            Err(NcryptError::Codec(_))
        ));
    }

    #[test]
    fn envelope_never_serializes_a_key_field() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("key").is_none());
    }
}
