// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the ncrypt client.

use thiserror::Error;

/// The primary error type used across all ncrypt crates.
///
/// Messages never include key material, passwords, or decrypted payloads.
#[derive(Debug, Error)]
pub enum NcryptError {
    /// Password stretching or the verification encryption failed.
    ///
    /// Fatal to the in-progress authentication flow; session custody is cleared.
    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// No master key is resident in session custody. The caller must re-authenticate.
    #[error("no master key in session, please log in again")]
    MissingMasterKey,

    /// Key generation or the AEAD seal primitive failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication tag did not verify (wrong key, tampered ciphertext, wrong nonce)
    /// or the decrypted payload was unusable.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// A share request carried no recipient criterion or an invalid role level.
    #[error("share validation failed: {0}")]
    ShareValidationFailed(String),

    /// The signed-in member's role may not perform the action. Raised locally
    /// before a request is sent, when the member's role is known.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed wire data (bad JSON, bad base64, wrong field lengths).
    #[error("codec error: {0}")]
    Codec(String),

    /// The server answered with a non-success status.
    #[error("api error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// The request never produced a response (connection refused, timeout, TLS).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An authenticated request was attempted without a bearer token.
    #[error("no authentication token, please log in")]
    Unauthenticated,

    /// Configuration errors (invalid TOML, missing fields, failed validation).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NcryptError {
    /// Returns `true` for errors that must force the user back to the login screen.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            Self::MissingMasterKey | Self::Unauthenticated | Self::Api { status: 401, .. }
        )
    }

    /// Returns `true` for tamper / wrong-key failures.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::DecryptionFailed(_))
    }
}

impl From<serde_json::Error> for NcryptError {
    fn from(e: serde_json::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reauthentication_errors() {
        assert!(NcryptError::MissingMasterKey.requires_reauthentication());
        assert!(NcryptError::Unauthenticated.requires_reauthentication());
        assert!(
            NcryptError::Api {
                status: 401,
                detail: "expired".into()
            }
            .requires_reauthentication()
        );
        assert!(
            !NcryptError::Api {
                status: 404,
                detail: "Secret not found".into()
            }
            .requires_reauthentication()
        );
        assert!(!NcryptError::DecryptionFailed("tag".into()).requires_reauthentication());
    }

    #[test]
    fn serde_errors_become_codec_errors() {
        let err: NcryptError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, NcryptError::Codec(_)));
    }

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            NcryptError::Api {
                status: 403,
                detail: "forbidden".into()
            }
            .to_string(),
            "api error (403): forbidden"
        );
        assert_eq!(
            NcryptError::PermissionDenied("cannot manage Owner".into()).to_string(),
            "permission denied: cannot manage Owner"
        );
        assert_eq!(
            NcryptError::MissingMasterKey.to_string(),
            "no master key in session, please log in again"
        );
    }
}
