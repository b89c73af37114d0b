// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sharing authorization model.
//!
//! A secret is either private or shared under exactly one [`SharingPolicy`].
//! Sharing again replaces the previous policy. The server enforces access; the
//! client only builds and validates requests and reads back the state.
//!
//! Filtering selectable role levels by the acting member's level is a UI
//! convenience and not a security boundary.

use std::collections::BTreeSet;

use ncrypt_core::{MemberId, NcryptError, RoleLevel};
use ncrypt_crypto::{GroupKeyGrant, GroupKeyring};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::records::SecretResource;

/// Who may read a shared secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharingPolicy {
    /// Every member of the vault.
    AllMembers,
    /// Members holding any of these role levels.
    RoleLevels(BTreeSet<RoleLevel>),
    /// Named members, each holding their own wrapped copy of a group key.
    ExplicitMembers(GroupKeyring),
}

impl SharingPolicy {
    /// Role-level policy from any iterator; duplicates collapse.
    pub fn role_levels(levels: impl IntoIterator<Item = RoleLevel>) -> Self {
        Self::RoleLevels(levels.into_iter().collect())
    }

    /// Reject policies that name no recipient.
    pub fn validate(&self) -> Result<(), NcryptError> {
        match self {
            Self::AllMembers => Ok(()),
            Self::RoleLevels(levels) if levels.is_empty() => Err(NcryptError::ShareValidationFailed(
                "select at least one role level or share with all members".to_string(),
            )),
            Self::ExplicitMembers(ring) if ring.is_empty() => Err(
                NcryptError::ShareValidationFailed("no member holds a group key grant".to_string()),
            ),
            Self::RoleLevels(_) | Self::ExplicitMembers(_) => Ok(()),
        }
    }

    /// Role levels in display order (descending). Empty for other policies.
    pub fn display_levels(&self) -> Vec<RoleLevel> {
        match self {
            Self::RoleLevels(levels) => levels.iter().rev().copied().collect(),
            Self::AllMembers | Self::ExplicitMembers(_) => Vec::new(),
        }
    }

    /// Whether a member at `level` (with id `member`) is a recipient.
    ///
    /// Informational only; the server decides.
    pub fn admits(&self, member: MemberId, level: RoleLevel) -> bool {
        match self {
            Self::AllMembers => true,
            Self::RoleLevels(levels) => levels.contains(&level),
            Self::ExplicitMembers(ring) => ring.contains(member),
        }
    }

    /// Validated request body for `POST /secrets/{id}/share`.
    pub fn to_request(&self) -> Result<ShareRequest, NcryptError> {
        self.validate()?;
        Ok(match self {
            Self::AllMembers => ShareRequest {
                share_with_all: true,
                role_levels: None,
                member_grants: None,
            },
            Self::RoleLevels(levels) => ShareRequest {
                share_with_all: false,
                role_levels: Some(levels.iter().copied().collect()),
                member_grants: None,
            },
            Self::ExplicitMembers(ring) => ShareRequest {
                share_with_all: false,
                role_levels: None,
                member_grants: Some(ring.grants().collect()),
            },
        })
    }
}

/// Body of `POST /secrets/{id}/share`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    pub share_with_all: bool,
    pub role_levels: Option<Vec<RoleLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_grants: Option<Vec<GroupKeyGrant>>,
}

impl ShareRequest {
    pub fn new(share_with_all: bool, role_levels: Vec<RoleLevel>) -> Self {
        Self {
            share_with_all,
            role_levels: Some(role_levels),
            member_grants: None,
        }
    }

    /// Interpret the request as a policy, rejecting one with no recipients.
    ///
    /// `share_with_all` wins over any listed role levels.
    pub fn validate(&self) -> Result<SharingPolicy, NcryptError> {
        let policy = if self.share_with_all {
            SharingPolicy::AllMembers
        } else if let Some(grants) = &self.member_grants {
            SharingPolicy::ExplicitMembers(GroupKeyring::from(grants.clone()))
        } else {
            SharingPolicy::role_levels(self.role_levels.iter().flatten().copied())
        };
        policy.validate()?;
        Ok(policy)
    }

    /// The request as it goes on the wire: role levels cleared when sharing
    /// with everyone, deduplicated and ascending otherwise.
    pub fn normalized(&self) -> Result<Self, NcryptError> {
        self.validate()?.to_request()
    }
}

/// Sharing state of a secret as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharingState {
    Private,
    Shared(SharingPolicy),
}

impl SharingState {
    pub fn from_resource(resource: &SecretResource) -> Self {
        if resource.share_with_all {
            return Self::Shared(SharingPolicy::AllMembers);
        }
        let levels: BTreeSet<RoleLevel> =
            resource.role_shares.iter().map(|s| s.role_level).collect();
        if resource.is_shared && !levels.is_empty() {
            Self::Shared(SharingPolicy::RoleLevels(levels))
        } else {
            Self::Private
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    /// Role badges to render, highest first.
    pub fn badges(&self) -> Vec<RoleLevel> {
        match self {
            Self::Shared(policy) => policy.display_levels(),
            Self::Private => Vec::new(),
        }
    }
}

/// Sort and deduplicate role levels for display, highest first.
pub fn display_order(levels: impl IntoIterator<Item = RoleLevel>) -> Vec<RoleLevel> {
    SharingPolicy::role_levels(levels).display_levels()
}

/// Role levels a member at `acting` is offered when sharing: `acting` and above.
pub fn selectable_levels(acting: RoleLevel) -> Vec<RoleLevel> {
    RoleLevel::iter().filter(|level| *level >= acting).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RoleShare;
    use ncrypt_core::SecretId;
    use ncrypt_crypto::generate_key;

    fn levels(raw: &[u8]) -> Vec<RoleLevel> {
        raw.iter().map(|l| RoleLevel::new(*l).unwrap()).collect()
    }

    #[test]
    fn display_order_is_descending() {
        let ordered: Vec<u8> = display_order(levels(&[3, 1, 5]))
            .into_iter()
            .map(RoleLevel::level)
            .collect();
        assert_eq!(ordered, vec![5, 3, 1]);
    }

    #[test]
    fn duplicate_levels_collapse() {
        let policy = SharingPolicy::role_levels(levels(&[2, 2, 4]));
        assert_eq!(policy.display_levels(), levels(&[4, 2]));
    }

    #[test]
    fn empty_role_share_is_rejected() {
        let req = ShareRequest::new(false, vec![]);
        assert!(matches!(
            req.validate(),
            Err(NcryptError::ShareValidationFailed(_))
        ));

        let null_levels = ShareRequest {
            share_with_all: false,
            role_levels: None,
            member_grants: None,
        };
        assert!(null_levels.validate().is_err());
    }

    #[test]
    fn share_with_all_clears_role_levels() {
        let req = ShareRequest::new(true, levels(&[3]));
        assert_eq!(req.validate().unwrap(), SharingPolicy::AllMembers);

        let wire = req.normalized().unwrap();
        assert!(wire.share_with_all);
        assert_eq!(wire.role_levels, None);

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json, serde_json::json!({"share_with_all": true, "role_levels": null}));
    }

    #[test]
    fn role_request_serializes_as_integers() {
        let wire = ShareRequest::new(false, levels(&[5, 3, 5]))
            .normalized()
            .unwrap();
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["role_levels"], serde_json::json!([3, 5]));
    }

    #[test]
    fn explicit_members_policy() {
        let (k1, _) = generate_key().unwrap();
        let (k2, _) = generate_key().unwrap();
        let (mut ring, group_key) = GroupKeyring::create(MemberId(1), &k1).unwrap();
        ring.add_member(&group_key, MemberId(2), &k2).unwrap();

        let policy = SharingPolicy::ExplicitMembers(ring.clone());
        assert!(policy.admits(MemberId(2), RoleLevel::Intern));
        assert!(!policy.admits(MemberId(3), RoleLevel::Owner));

        let wire = policy.to_request().unwrap();
        assert_eq!(wire.member_grants.as_ref().map(Vec::len), Some(2));
        assert_eq!(wire.validate().unwrap(), policy);

        let empty = SharingPolicy::ExplicitMembers(GroupKeyring::new());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn selectable_levels_start_at_acting_level() {
        assert_eq!(selectable_levels(RoleLevel::Director), levels(&[5, 6, 7]));
        assert_eq!(selectable_levels(RoleLevel::Intern).len(), 7);
    }

    #[test]
    fn state_from_resource() {
        let mut resource: SecretResource = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "t",
            "client_encrypted_data": "{}",
            "created_by_user_id": 1,
            "created_at": "2026-01-01T00:00:00",
        }))
        .unwrap();
        assert_eq!(resource.id, SecretId(1));
        assert_eq!(SharingState::from_resource(&resource), SharingState::Private);

        resource.is_shared = true;
        resource.role_shares = vec![
            RoleShare { id: 1, role_level: RoleLevel::Senior },
            RoleShare { id: 2, role_level: RoleLevel::Exec },
        ];
        let state = SharingState::from_resource(&resource);
        assert!(state.is_shared());
        assert_eq!(state.badges(), levels(&[6, 3]));

        resource.share_with_all = true;
        assert_eq!(
            SharingState::from_resource(&resource),
            SharingState::Shared(SharingPolicy::AllMembers)
        );
    }
}
