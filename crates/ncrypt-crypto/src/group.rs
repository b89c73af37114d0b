// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group key wrapping: one symmetric group key, re-encrypted once per member.
//!
//! Each member receives a [`GroupKeyGrant`] holding the group key sealed under
//! that member's own master key. Only the holder of the member key can unwrap
//! it. No asymmetric cryptography is involved.

use std::collections::BTreeMap;

use ncrypt_core::{MemberId, NcryptError};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN, SymmetricKey};
use crate::envelope::EncryptedEnvelope;

/// The plaintext group key.
///
/// Unlike a [`SymmetricKey`] it can be re-wrapped for further members, which
/// requires access to its bytes inside this module.
#[derive(Clone)]
pub struct GroupKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl GroupKey {
    fn from_slice(bytes: &[u8]) -> Result<Self, NcryptError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            NcryptError::DecryptionFailed("unwrapped group key has the wrong length".to_string())
        })?;
        Ok(Self {
            bytes: Zeroizing::new(bytes),
        })
    }

    /// The group key as an AEAD key for group secrets.
    pub fn to_symmetric(&self) -> SymmetricKey {
        SymmetricKey::from_array(*self.bytes)
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for GroupKey {}

impl std::fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GroupKey([REDACTED])")
    }
}

/// A newly generated group key and its self-wrapped form.
#[derive(Debug)]
pub struct GeneratedGroupKey {
    /// Random seed sealed under the new key; proves the key works before it is
    /// handed to anyone.
    pub envelope: EncryptedEnvelope,
    pub key: GroupKey,
}

/// One member's copy of the group key, sealed under that member's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKeyGrant {
    pub member_id: MemberId,
    pub wrapped_key: EncryptedEnvelope,
}

/// Generate a fresh group key through the engine's key-generation path.
pub fn generate_group_key() -> Result<GeneratedGroupKey, NcryptError> {
    let seed = Zeroizing::new(crypto::random_bytes::<KEY_LEN>("group key seed")?);

    let sealed = crypto::encrypt(seed.as_ref(), None)?;
    let exported = sealed.exported_key.ok_or_else(|| {
        NcryptError::EncryptionFailed("key generation did not export a key".to_string())
    })?;

    Ok(GeneratedGroupKey {
        envelope: sealed.envelope,
        key: GroupKey {
            bytes: Zeroizing::new(*exported.expose()),
        },
    })
}

/// Seal the group key under `member_key`, producing that member's grant.
pub fn wrap_for_member(
    group_key: &GroupKey,
    member_id: MemberId,
    member_key: &SymmetricKey,
) -> Result<GroupKeyGrant, NcryptError> {
    let wrapped_key = crypto::seal(member_key, group_key.bytes.as_ref())?;
    debug!(member_id = %member_id, "group key wrapped for member");
    Ok(GroupKeyGrant {
        member_id,
        wrapped_key,
    })
}

/// Recover the group key from a grant. Fails with
/// [`NcryptError::DecryptionFailed`] if `member_key` is not the key the grant
/// was wrapped under.
pub fn unwrap_group_key(
    grant: &GroupKeyGrant,
    member_key: &SymmetricKey,
) -> Result<GroupKey, NcryptError> {
    let bytes = crypto::open(member_key, &grant.wrapped_key)?;
    GroupKey::from_slice(&bytes)
}

/// Seal a group-scoped secret under the group key.
pub fn encrypt_group_secret(
    plaintext: &[u8],
    group_key: &GroupKey,
) -> Result<EncryptedEnvelope, NcryptError> {
    crypto::seal(&group_key.to_symmetric(), plaintext)
}

/// Open a group-scoped secret with the group key.
pub fn decrypt_group_secret(
    envelope: &EncryptedEnvelope,
    group_key: &GroupKey,
) -> Result<Zeroizing<Vec<u8>>, NcryptError> {
    crypto::open(&group_key.to_symmetric(), envelope)
}

/// All grants of one group key, keyed by member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<GroupKeyGrant>", into = "Vec<GroupKeyGrant>")]
pub struct GroupKeyring {
    grants: BTreeMap<MemberId, EncryptedEnvelope>,
}

impl GroupKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a keyring for a new group, granting the key to its creator.
    pub fn create(
        creator: MemberId,
        creator_key: &SymmetricKey,
    ) -> Result<(Self, GroupKey), NcryptError> {
        let generated = generate_group_key()?;
        let mut ring = Self::new();
        ring.add_member(&generated.key, creator, creator_key)?;
        Ok((ring, generated.key))
    }

    /// Grant the group key to `member_id`, replacing any earlier grant.
    pub fn add_member(
        &mut self,
        group_key: &GroupKey,
        member_id: MemberId,
        member_key: &SymmetricKey,
    ) -> Result<(), NcryptError> {
        let grant = wrap_for_member(group_key, member_id, member_key)?;
        self.grants.insert(grant.member_id, grant.wrapped_key);
        Ok(())
    }

    /// Add a member using an existing member's grant to recover the group key.
    pub fn admit(
        &mut self,
        sponsor: MemberId,
        sponsor_key: &SymmetricKey,
        member_id: MemberId,
        member_key: &SymmetricKey,
    ) -> Result<(), NcryptError> {
        let group_key = self.unwrap_for(sponsor, sponsor_key)?;
        self.add_member(&group_key, member_id, member_key)
    }

    /// Remove a member's grant. Returns `true` if a grant existed.
    ///
    /// The member may still hold a previously unwrapped copy of the key.
    pub fn remove_member(&mut self, member_id: MemberId) -> bool {
        self.grants.remove(&member_id).is_some()
    }

    pub fn grant(&self, member_id: MemberId) -> Option<GroupKeyGrant> {
        self.grants.get(&member_id).map(|wrapped_key| GroupKeyGrant {
            member_id,
            wrapped_key: wrapped_key.clone(),
        })
    }

    /// Unwrap the group key with `member_id`'s grant.
    pub fn unwrap_for(
        &self,
        member_id: MemberId,
        member_key: &SymmetricKey,
    ) -> Result<GroupKey, NcryptError> {
        let grant = self.grant(member_id).ok_or_else(|| {
            NcryptError::DecryptionFailed(format!("member {member_id} holds no group key grant"))
        })?;
        unwrap_group_key(&grant, member_key)
    }

    pub fn contains(&self, member_id: MemberId) -> bool {
        self.grants.contains_key(&member_id)
    }

    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.grants.keys().copied()
    }

    pub fn grants(&self) -> impl Iterator<Item = GroupKeyGrant> + '_ {
        self.grants.iter().map(|(id, wrapped)| GroupKeyGrant {
            member_id: *id,
            wrapped_key: wrapped.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl From<Vec<GroupKeyGrant>> for GroupKeyring {
    fn from(grants: Vec<GroupKeyGrant>) -> Self {
        Self {
            grants: grants
                .into_iter()
                .map(|g| (g.member_id, g.wrapped_key))
                .collect(),
        }
    }
}

impl From<GroupKeyring> for Vec<GroupKeyGrant> {
    fn from(ring: GroupKeyring) -> Self {
        ring.grants
            .into_iter()
            .map(|(member_id, wrapped_key)| GroupKeyGrant {
                member_id,
                wrapped_key,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_keys(n: usize) -> Vec<SymmetricKey> {
        (0..n).map(|_| crypto::generate_key().unwrap().0).collect()
    }

    #[test]
    fn wrap_unwrap_roundtrip_for_every_member() {
        let group = generate_group_key().unwrap();
        let keys = member_keys(4);

        for (i, key) in keys.iter().enumerate() {
            let grant = wrap_for_member(&group.key, MemberId(i as i64), key).unwrap();
            let unwrapped = unwrap_group_key(&grant, key).unwrap();
            assert_eq!(unwrapped, group.key);
        }
    }

    #[test]
    fn grant_does_not_open_with_another_members_key() {
        let group = generate_group_key().unwrap();
        let keys = member_keys(2);

        let grant = wrap_for_member(&group.key, MemberId(1), &keys[0]).unwrap();
        let err = unwrap_group_key(&grant, &keys[1]).unwrap_err();
        assert!(matches!(err, NcryptError::DecryptionFailed(_)));
    }

    #[test]
    fn generated_envelope_opens_with_group_key() {
        let group = generate_group_key().unwrap();
        let seed = crypto::open(&group.key.to_symmetric(), &group.envelope).unwrap();
        assert_eq!(seed.len(), KEY_LEN);
        assert_ne!(seed.as_slice(), group.key.bytes.as_slice());
    }

    #[test]
    fn generated_seeds_differ() {
        let a = generate_group_key().unwrap();
        let b = generate_group_key().unwrap();
        let seed_a = crypto::open(&a.key.to_symmetric(), &a.envelope).unwrap();
        let seed_b = crypto::open(&b.key.to_symmetric(), &b.envelope).unwrap();
        assert_ne!(seed_a.as_slice(), seed_b.as_slice());
    }

    #[test]
    fn group_secret_passthrough() {
        let group = generate_group_key().unwrap();
        let envelope = encrypt_group_secret(b"db password", &group.key).unwrap();
        let plain = decrypt_group_secret(&envelope, &group.key).unwrap();
        assert_eq!(plain.as_slice(), b"db password");

        let other = generate_group_key().unwrap();
        assert!(decrypt_group_secret(&envelope, &other.key).is_err());
    }

    #[test]
    fn keyring_admit_and_remove() {
        let keys = member_keys(3);
        let (mut ring, group_key) = GroupKeyring::create(MemberId(1), &keys[0]).unwrap();

        ring.admit(MemberId(1), &keys[0], MemberId(2), &keys[1]).unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.unwrap_for(MemberId(2), &keys[1]).unwrap(), group_key);

        // A non-member cannot sponsor anyone.
        assert!(
            ring.admit(MemberId(3), &keys[2], MemberId(3), &keys[2])
                .is_err()
        );

        assert!(ring.remove_member(MemberId(2)));
        assert!(!ring.contains(MemberId(2)));
        assert!(ring.unwrap_for(MemberId(2), &keys[1]).is_err());
    }

    #[test]
    fn keyring_serializes_as_grant_list() {
        let keys = member_keys(1);
        let (ring, _) = GroupKeyring::create(MemberId(9), &keys[0]).unwrap();

        let json = serde_json::to_value(&ring).unwrap();
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["member_id"], 9);
        assert!(list[0]["wrapped_key"]["iv"].is_string());

        let back: GroupKeyring = serde_json::from_value(json).unwrap();
        assert_eq!(back, ring);
    }

    #[test]
    fn group_key_debug_is_redacted() {
        let group = generate_group_key().unwrap();
        assert_eq!(format!("{:?}", group.key), "GroupKey([REDACTED])");
    }
}
