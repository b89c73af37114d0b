// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret payload codec.
//!
//! The confidential part of a secret is the JSON object
//! `{"password": ..., "description": ...}`, sealed under the session master
//! key. Titles stay plaintext.
//!
//! Decoding is isolated per record: a record that fails to open yields a
//! [`DecodeFailure`] next to its successfully decoded neighbours, never an
//! error for the whole list.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use ncrypt_core::{MemberId, NcryptError, SecretId};
use ncrypt_crypto::{EncryptedEnvelope, SymmetricKey, open, seal};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::records::{
    CreateSecretRequest, DECRYPTION_FAILED_DESCRIPTION, DECRYPTION_FAILED_PASSWORD,
    SecretResource,
};

/// Plaintext payload of a secret.
#[derive(Debug)]
pub struct SecretPayload {
    pub password: SecretString,
    pub description: String,
}

impl SecretPayload {
    pub fn new(password: SecretString, description: impl Into<String>) -> Self {
        Self {
            password,
            description: description.into(),
        }
    }

    fn sentinel() -> Self {
        Self {
            password: SecretString::from(DECRYPTION_FAILED_PASSWORD.to_string()),
            description: DECRYPTION_FAILED_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Serialize)]
struct PayloadOut<'a> {
    password: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
struct PayloadIn {
    password: String,
    #[serde(default)]
    description: String,
}

/// A secret record together with its opened payload.
#[derive(Debug)]
pub struct DecodedSecret {
    pub resource: SecretResource,
    pub payload: SecretPayload,
}

impl DecodedSecret {
    /// Whether this entry carries the decryption-failure sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.payload.password.expose_secret() == DECRYPTION_FAILED_PASSWORD
            && self.payload.description == DECRYPTION_FAILED_DESCRIPTION
    }
}

/// The record a [`DecodeFailure`] belongs to.
#[derive(Debug)]
pub enum FailedRecord {
    /// The record parsed; its payload did not open.
    Parsed(SecretResource),
    /// The record itself did not match the wire shape. `id` and `title`
    /// are kept when they could still be read from the raw JSON.
    Unparsed {
        id: Option<SecretId>,
        title: Option<String>,
        raw: Value,
    },
}

impl FailedRecord {
    fn unparsed(raw: Value) -> Self {
        let id = raw.get("id").and_then(Value::as_i64).map(SecretId);
        let title = raw.get("title").and_then(Value::as_str).map(str::to_string);
        Self::Unparsed { id, title, raw }
    }

    /// Best-effort record for display. Unparsed records fall back to
    /// whatever plaintext metadata survived.
    fn into_resource(self) -> SecretResource {
        match self {
            Self::Parsed(resource) => resource,
            Self::Unparsed { id, title, raw } => SecretResource {
                id: id.unwrap_or(SecretId(0)),
                title: title.unwrap_or_default(),
                description: None,
                client_encrypted_data: String::new(),
                is_password: true,
                created_by_user_id: MemberId(
                    raw.get("created_by_user_id").and_then(Value::as_i64).unwrap_or(0),
                ),
                created_at: DateTime::<Utc>::UNIX_EPOCH,
                updated_at: None,
                is_shared: raw.get("is_shared").and_then(Value::as_bool).unwrap_or(false),
                share_with_all: raw
                    .get("share_with_all")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                role_shares: Vec::new(),
            },
        }
    }
}

/// A record that could not be decoded, with the reason.
#[derive(Debug)]
pub struct DecodeFailure {
    pub record: FailedRecord,
    pub error: NcryptError,
}

impl DecodeFailure {
    /// Id of the failed record, when known.
    pub fn id(&self) -> Option<SecretId> {
        match &self.record {
            FailedRecord::Parsed(resource) => Some(resource.id),
            FailedRecord::Unparsed { id, .. } => *id,
        }
    }

    /// The parsed record, if the failure happened after parsing.
    pub fn resource(&self) -> Option<&SecretResource> {
        match &self.record {
            FailedRecord::Parsed(resource) => Some(resource),
            FailedRecord::Unparsed { .. } => None,
        }
    }

    /// Keep the record but replace its payload with the visible sentinel.
    pub fn into_sentinel(self) -> DecodedSecret {
        DecodedSecret {
            resource: self.record.into_resource(),
            payload: SecretPayload::sentinel(),
        }
    }
}

impl std::fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id() {
            Some(id) => write!(f, "secret {id}: {}", self.error),
            None => write!(f, "secret without id: {}", self.error),
        }
    }
}

impl std::error::Error for DecodeFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type DecodeResult = Result<DecodedSecret, DecodeFailure>;

/// Seal a payload under `key`. Every call uses a fresh nonce.
pub fn encode_payload(
    payload: &SecretPayload,
    key: &SymmetricKey,
) -> Result<EncryptedEnvelope, NcryptError> {
    let json = Zeroizing::new(serde_json::to_vec(&PayloadOut {
        password: payload.password.expose_secret(),
        description: &payload.description,
    })?);
    seal(key, &json)
}

/// Build the `POST /secrets` body for a new secret.
pub fn create_secret(
    title: &str,
    payload: &SecretPayload,
    key: &SymmetricKey,
) -> Result<CreateSecretRequest, NcryptError> {
    let envelope = encode_payload(payload, key)?;
    CreateSecretRequest::new(title, &envelope)
}

/// Open a payload envelope.
pub fn decode_payload(
    envelope: &EncryptedEnvelope,
    key: &SymmetricKey,
) -> Result<SecretPayload, NcryptError> {
    let plaintext = open(key, envelope)?;
    let parsed: PayloadIn = serde_json::from_slice(&plaintext)?;
    Ok(SecretPayload {
        password: SecretString::from(parsed.password),
        description: parsed.description,
    })
}

/// Decode one record. Malformed envelopes and failed authentication both
/// produce a [`DecodeFailure`] that still carries the record.
pub fn decode_secret(resource: SecretResource, key: &SymmetricKey) -> DecodeResult {
    match resource
        .envelope()
        .and_then(|envelope| decode_payload(&envelope, key))
    {
        Ok(payload) => Ok(DecodedSecret { resource, payload }),
        Err(error) => {
            warn!(secret_id = %resource.id, error = %error, "failed to decrypt secret");
            Err(DecodeFailure {
                record: FailedRecord::Parsed(resource),
                error,
            })
        }
    }
}

/// Parse and decode one raw record as it came off the wire.
///
/// A record that does not match the [`SecretResource`] shape (a null
/// envelope, an unknown role level, a bad timestamp) is a per-record
/// failure like any other.
pub fn decode_record(raw: Value, key: &SymmetricKey) -> DecodeResult {
    match SecretResource::deserialize(&raw) {
        Ok(resource) => decode_secret(resource, key),
        Err(err) => {
            let failure = DecodeFailure {
                record: FailedRecord::unparsed(raw),
                error: err.into(),
            };
            warn!(
                secret_id = ?failure.id().map(|id| id.0),
                error = %failure.error,
                "failed to parse secret record"
            );
            Err(failure)
        }
    }
}

/// Decode one record, sentinel on failure.
pub fn decode_secret_or_sentinel(resource: SecretResource, key: &SymmetricKey) -> DecodedSecret {
    decode_secret(resource, key).unwrap_or_else(DecodeFailure::into_sentinel)
}

async fn decode_one(raw: Value, key: &SymmetricKey) -> DecodeResult {
    tokio::task::yield_now().await;
    decode_record(raw, key)
}

/// Decode a batch of raw records, up to `concurrency` at a time.
///
/// The output has one entry per input, in input order, whatever order the
/// decryptions complete in.
pub async fn decode_secret_batch(
    records: Vec<Value>,
    key: &SymmetricKey,
    concurrency: usize,
) -> Vec<DecodeResult> {
    let total = records.len();
    let results: Vec<DecodeResult> = stream::iter(records)
        .map(|raw| decode_one(raw, key))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    debug!(total, failed, "secret batch decoded");
    results
}

/// Collapse per-record results into a list with sentinels for failures.
pub fn with_sentinels(results: Vec<DecodeResult>) -> Vec<DecodedSecret> {
    results
        .into_iter()
        .map(|r| r.unwrap_or_else(DecodeFailure::into_sentinel))
        .collect()
}
