// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire records exchanged with the vault API.

use chrono::{DateTime, NaiveDateTime, Utc};
use ncrypt_core::{MemberId, NcryptError, RoleLevel, SecretId};
use ncrypt_crypto::EncryptedEnvelope;
use serde::{Deserialize, Deserializer, Serialize};

/// Password shown in place of a secret that failed to decrypt.
pub const DECRYPTION_FAILED_PASSWORD: &str = "**DECRYPTION_FAILED**";

/// Description shown in place of a secret that failed to decrypt.
pub const DECRYPTION_FAILED_DESCRIPTION: &str = "Failed to decrypt description";

/// The server-side `description` column never holds the real description.
pub const SERVER_DESCRIPTION_PLACEHOLDER: &str = "Encrypted";

/// One granted role level on a shared secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleShare {
    pub id: i64,
    pub role_level: RoleLevel,
}

/// A secret as returned by the server.
///
/// `client_encrypted_data` is the JSON text of an `{encrypted, iv}` envelope;
/// `title` is plaintext metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretResource {
    pub id: SecretId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub client_encrypted_data: String,
    #[serde(default = "default_true")]
    pub is_password: bool,
    pub created_by_user_id: MemberId,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub share_with_all: bool,
    #[serde(default)]
    pub role_shares: Vec<RoleShare>,
}

pub(crate) fn default_true() -> bool {
    true
}

impl SecretResource {
    /// Parse the envelope carried in `client_encrypted_data`.
    pub fn envelope(&self) -> Result<EncryptedEnvelope, NcryptError> {
        EncryptedEnvelope::from_json_str(&self.client_encrypted_data)
    }
}

/// Body of `POST /secrets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSecretRequest {
    pub title: String,
    pub description: String,
    pub client_encrypted_data: String,
    pub is_password: bool,
}

impl CreateSecretRequest {
    pub fn new(title: impl Into<String>, envelope: &EncryptedEnvelope) -> Result<Self, NcryptError> {
        Ok(Self {
            title: title.into(),
            description: SERVER_DESCRIPTION_PLACEHOLDER.to_string(),
            client_encrypted_data: envelope.to_json_string()?,
            is_password: true,
        })
    }
}

/// Body of `PUT /secrets/{id}` when only the payload changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateSecretRequest {
    pub client_encrypted_data: String,
}

// The server emits naive ISO-8601 timestamps (UTC); accept RFC 3339 as well.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp `{raw}`: {e}"))
}

pub(crate) fn timestamp<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(de)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn optional_timestamp<'de, D: Deserializer<'de>>(de: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<String>::deserialize(de)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn wire() -> serde_json::Value {
        json!({
            "id": 3,
            "title": "staging db",
            "description": "Encrypted",
            "client_encrypted_data": "{\"encrypted\":\"x\",\"iv\":\"y\"}",
            "is_password": true,
            "created_by_user_id": 1,
            "created_at": "2026-02-01T09:30:00.123456",
            "updated_at": "2026-02-02T10:00:00Z",
            "is_shared": true,
            "share_with_all": false,
            "role_shares": [{"id": 10, "role_level": 5}, {"id": 11, "role_level": 3}]
        })
    }

    #[test]
    fn parses_server_resource() {
        let r: SecretResource = serde_json::from_value(wire()).unwrap();
        assert_eq!(r.id, SecretId(3));
        assert_eq!(r.created_at.day(), 1);
        assert_eq!(r.created_at.minute(), 30);
        assert!(r.updated_at.is_some());
        assert_eq!(r.role_shares[0].role_level, RoleLevel::Director);
    }

    #[test]
    fn sharing_fields_default_when_absent() {
        let mut v = wire();
        let obj = v.as_object_mut().unwrap();
        for key in ["updated_at", "is_shared", "share_with_all", "role_shares", "description"] {
            obj.remove(key);
        }
        let r: SecretResource = serde_json::from_value(v).unwrap();
        assert!(!r.is_shared);
        assert!(r.role_shares.is_empty());
        assert_eq!(r.updated_at, None);
        assert_eq!(r.description, None);
    }

    #[test]
    fn out_of_range_role_level_is_rejected() {
        let mut v = wire();
        v["role_shares"] = json!([{"id": 1, "role_level": 9}]);
        assert!(serde_json::from_value::<SecretResource>(v).is_err());
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let mut v = wire();
        v["created_at"] = json!("yesterday");
        assert!(serde_json::from_value::<SecretResource>(v).is_err());
    }

    #[test]
    fn create_request_carries_placeholder_description() {
        let (key, _) = ncrypt_crypto::generate_key().unwrap();
        let env = ncrypt_crypto::seal(&key, b"{}").unwrap();
        let req = CreateSecretRequest::new("api token", &env).unwrap();

        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["description"], "Encrypted");
        assert_eq!(v["is_password"], true);
        let inner: serde_json::Value =
            serde_json::from_str(v["client_encrypted_data"].as_str().unwrap()).unwrap();
        assert!(inner["encrypted"].is_string());
        assert!(inner["iv"].is_string());
    }
}
