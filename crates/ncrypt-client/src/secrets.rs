// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secrets API.
//!
//! Every operation that touches a payload checks for the master key before
//! making a request. Reads go through the per-record decode path, so one
//! corrupted or malformed record never fails a whole list.

use ncrypt_core::{ApiRequest, NcryptError, SecretId};
use secrecy::SecretString;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::client::VaultClient;
use crate::codec::{self, DecodeResult, SecretPayload};
use crate::records::{SecretResource, UpdateSecretRequest};
use crate::sharing::SharingPolicy;

impl VaultClient {
    /// Encrypt and store a new secret. Returns the stored record.
    pub async fn create_secret(
        &self,
        title: &str,
        password: SecretString,
        description: &str,
    ) -> Result<SecretResource, NcryptError> {
        let bundle = self.session.master_key()?;
        let payload = SecretPayload::new(password, description);
        let body = codec::create_secret(title, &payload, bundle.key())?;

        let created: SecretResource = self
            .send_authed(ApiRequest::post("/secrets").json(serde_json::to_value(&body)?))
            .await?
            .parse()?;
        info!(secret_id = %created.id, "secret created");
        Ok(created)
    }

    /// Secrets owned by the signed-in member, decoded in server order.
    pub async fn list_secrets(&self) -> Result<Vec<DecodeResult>, NcryptError> {
        self.fetch_and_decode("/secrets").await
    }

    /// Secrets other members shared with the signed-in member.
    pub async fn list_shared_secrets(&self) -> Result<Vec<DecodeResult>, NcryptError> {
        self.fetch_and_decode("/secrets/shared").await
    }

    /// Share a secret under `policy`, replacing any previous sharing.
    ///
    /// An empty policy is rejected before anything is sent.
    pub async fn share_secret(
        &self,
        id: SecretId,
        policy: &SharingPolicy,
    ) -> Result<DecodeResult, NcryptError> {
        let request = policy.to_request()?;
        let bundle = self.session.master_key()?;

        let shared: Value = self
            .send_authed(
                ApiRequest::post(format!("/secrets/{id}/share"))
                    .json(serde_json::to_value(&request)?),
            )
            .await?
            .parse()?;
        info!(secret_id = %id, share_with_all = request.share_with_all, "secret shared");
        Ok(codec::decode_record(shared, bundle.key()))
    }

    /// Replace a secret's payload. The new envelope uses a fresh nonce.
    pub async fn update_secret_payload(
        &self,
        id: SecretId,
        password: SecretString,
        description: &str,
    ) -> Result<DecodeResult, NcryptError> {
        let bundle = self.session.master_key()?;
        let payload = SecretPayload::new(password, description);
        let envelope = codec::encode_payload(&payload, bundle.key())?;
        let body = UpdateSecretRequest {
            client_encrypted_data: envelope.to_json_string()?,
        };

        let updated: Value = self
            .send_authed(ApiRequest::put(format!("/secrets/{id}")).json(serde_json::to_value(&body)?))
            .await?
            .parse()?;
        info!(secret_id = %id, "secret payload updated");
        Ok(codec::decode_record(updated, bundle.key()))
    }

    /// Rename a secret. Titles are plaintext metadata.
    pub async fn rename_secret(&self, id: SecretId, title: &str) -> Result<SecretResource, NcryptError> {
        self.send_authed(ApiRequest::put(format!("/secrets/{id}")).json(json!({ "title": title })))
            .await?
            .parse()
    }

    pub async fn delete_secret(&self, id: SecretId) -> Result<(), NcryptError> {
        self.send_authed(ApiRequest::delete(format!("/secrets/{id}")))
            .await?;
        info!(secret_id = %id, "secret deleted");
        Ok(())
    }

    async fn fetch_and_decode(&self, path: &str) -> Result<Vec<DecodeResult>, NcryptError> {
        let bundle = self.session.master_key()?;
        // Parsed one record at a time so a malformed record stays local.
        let records: Vec<Value> = self.send_authed(ApiRequest::get(path)).await?.parse()?;
        debug!(path, count = records.len(), "fetched secrets");

        Ok(codec::decode_secret_batch(records, bundle.key(), self.decode_concurrency).await)
    }
}
