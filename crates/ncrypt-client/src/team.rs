// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Team members and invitations.
//!
//! A member may only invite or promote others to levels strictly below their
//! own. When the signed-in member's level is known the rule is checked
//! before anything is sent; the server enforces it either way.

use chrono::{DateTime, Utc};
use ncrypt_core::{ApiRequest, MemberId, NcryptError, RoleLevel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::VaultClient;
use crate::records::{default_true, optional_timestamp, timestamp};

/// A member of the vault's team, as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role_level: RoleLevel,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Set while the member has not accepted their invitation yet.
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub invitation_expires_at: Option<DateTime<Utc>>,
}

impl TeamMember {
    /// "First Last", falling back to the email when no name is on record.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() { self.email.clone() } else { name }
    }
}

/// Body of `POST /users/invite`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role_level: RoleLevel,
}

impl InviteRequest {
    pub fn new(email: impl Into<String>, first_name: impl Into<String>, role_level: RoleLevel) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: None,
            role_level,
        }
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }
}

/// The invitee as echoed back by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvitedUser {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role_level: RoleLevel,
}

/// Response of `POST /users/invite`. The token is what the invitee passes
/// to [`VaultClient::accept_invite`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invitation {
    #[serde(default)]
    pub message: String,
    /// Role name, e.g. `"Senior"`.
    #[serde(default)]
    pub role: String,
    pub invitation_token: String,
    #[serde(deserialize_with = "timestamp")]
    pub expires_at: DateTime<Utc>,
    pub invited_user: InvitedUser,
}

/// An invitation sent by the signed-in member and not yet accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PendingInvite {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role_level: RoleLevel,
    #[serde(default)]
    pub role_name: String,
    pub invitation_token: String,
    #[serde(deserialize_with = "timestamp")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PendingInvites {
    pending_invites: Vec<PendingInvite>,
}

/// Body of `PUT /users/team-members/{id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamMemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_level: Option<RoleLevel>,
}

impl TeamMemberUpdate {
    pub fn role(role_level: RoleLevel) -> Self {
        Self {
            role_level: Some(role_level),
            ..Self::default()
        }
    }
}

impl VaultClient {
    /// Levels the signed-in member may invite or promote to. Empty while the
    /// member's own level is unknown.
    pub fn assignable_levels(&self) -> Vec<RoleLevel> {
        self.session
            .role_level()
            .map(RoleLevel::subordinates)
            .unwrap_or_default()
    }

    /// Invite a new member at `request.role_level`.
    pub async fn invite_member(&self, request: &InviteRequest) -> Result<Invitation, NcryptError> {
        self.ensure_can_assign(request.role_level)?;

        let invitation: Invitation = self
            .send_authed(ApiRequest::post("/users/invite").json(serde_json::to_value(request)?))
            .await?
            .parse()?;
        info!(role_level = request.role_level.level(), expires_at = %invitation.expires_at, "member invited");
        Ok(invitation)
    }

    /// Invitations sent by the signed-in member that are still outstanding.
    pub async fn list_pending_invites(&self) -> Result<Vec<PendingInvite>, NcryptError> {
        let pending: PendingInvites = self
            .send_authed(ApiRequest::get("/users/pending-invites"))
            .await?
            .parse()?;
        debug!(count = pending.pending_invites.len(), "fetched pending invites");
        Ok(pending.pending_invites)
    }

    pub async fn list_team_members(&self) -> Result<Vec<TeamMember>, NcryptError> {
        let members: Vec<TeamMember> = self
            .send_authed(ApiRequest::get("/users/team-members"))
            .await?
            .parse()?;
        debug!(count = members.len(), "fetched team members");
        Ok(members)
    }

    pub async fn get_team_member(&self, id: MemberId) -> Result<TeamMember, NcryptError> {
        self.send_authed(ApiRequest::get(format!("/users/team-members/{id}")))
            .await?
            .parse()
    }

    /// Change a member's name or role. A role change is checked like an
    /// invitation.
    pub async fn update_team_member(
        &self,
        id: MemberId,
        update: &TeamMemberUpdate,
    ) -> Result<TeamMember, NcryptError> {
        if let Some(level) = update.role_level {
            self.ensure_can_assign(level)?;
        }

        let member: TeamMember = self
            .send_authed(
                ApiRequest::put(format!("/users/team-members/{id}"))
                    .json(serde_json::to_value(update)?),
            )
            .await?
            .parse()?;
        info!(member_id = %id, role_level = member.role_level.level(), "team member updated");
        Ok(member)
    }

    pub async fn remove_team_member(&self, id: MemberId) -> Result<(), NcryptError> {
        self.send_authed(ApiRequest::delete(format!("/users/team-members/{id}")))
            .await?;
        info!(member_id = %id, "team member removed");
        Ok(())
    }

    // Unknown own level: nothing to check locally, the server decides.
    fn ensure_can_assign(&self, target: RoleLevel) -> Result<(), NcryptError> {
        match self.session.role_level() {
            Some(own) if !own.can_manage(target) => Err(NcryptError::PermissionDenied(format!(
                "a {own} can only assign levels below their own, not {target}"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_parses_with_optional_fields_missing() {
        let member: TeamMember = serde_json::from_value(json!({
            "id": 4,
            "email": "ana@example.com",
            "role_level": 3,
        }))
        .unwrap();
        assert_eq!(member.id, MemberId(4));
        assert!(member.is_active);
        assert_eq!(member.invitation_expires_at, None);
        assert_eq!(member.display_name(), "ana@example.com");
    }

    #[test]
    fn display_name_joins_present_parts() {
        let member: TeamMember = serde_json::from_value(json!({
            "id": 1,
            "email": "x@example.com",
            "first_name": "Ana",
            "last_name": null,
            "role_level": 1,
            "is_active": false,
            "invitation_expires_at": "2026-03-01T12:00:00.123456",
        }))
        .unwrap();
        assert_eq!(member.display_name(), "Ana");
        assert!(!member.is_active);
        assert!(member.invitation_expires_at.is_some());
    }

    #[test]
    fn member_with_out_of_range_role_is_rejected() {
        let parsed = serde_json::from_value::<TeamMember>(json!({
            "id": 1, "email": "x@example.com", "role_level": 8,
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn update_omits_unset_fields() {
        let body = serde_json::to_value(TeamMemberUpdate::role(RoleLevel::Senior)).unwrap();
        assert_eq!(body, json!({"role_level": 3}));
        assert_eq!(serde_json::to_value(TeamMemberUpdate::default()).unwrap(), json!({}));
    }

    #[test]
    fn invite_request_wire_shape() {
        let body = serde_json::to_value(
            InviteRequest::new("new@example.com", "New", RoleLevel::Junior).with_last_name("Hire"),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "email": "new@example.com",
                "first_name": "New",
                "last_name": "Hire",
                "role_level": 2,
            })
        );
    }
}
