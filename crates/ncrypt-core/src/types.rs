// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared by the crypto and client crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::NcryptError;

/// Server-assigned identifier of a secret record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretId(pub i64);

impl std::fmt::Display for SecretId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned identifier of a team member (user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub i64);

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rank in the fixed 1..=7 role hierarchy.
///
/// Variant order is the numeric order, so the derived `Ord` matches the level.
/// On the wire a role level is a bare integer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum RoleLevel {
    Intern = 1,
    Junior = 2,
    Senior = 3,
    Manager = 4,
    Director = 5,
    Exec = 6,
    Owner = 7,
}

impl RoleLevel {
    /// Lowest level.
    pub const MIN: RoleLevel = RoleLevel::Intern;
    /// Highest level (the vault owner).
    pub const MAX: RoleLevel = RoleLevel::Owner;

    /// Build a role level from its integer rank.
    pub fn new(level: u8) -> Result<Self, NcryptError> {
        Self::iter()
            .find(|r| r.level() == level)
            .ok_or_else(|| NcryptError::ShareValidationFailed(format!("role level {level} is outside 1..=7")))
    }

    /// Integer rank of this level.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Short description shown next to the role name.
    pub fn description(self) -> &'static str {
        match self {
            Self::Owner => "Full system access and user management",
            Self::Exec => "Executive level access",
            Self::Director => "Director level access",
            Self::Manager => "Team management and oversight",
            Self::Senior => "Senior team member",
            Self::Junior => "Junior team member",
            Self::Intern => "Limited access",
        }
    }

    /// Levels strictly below this one.
    pub fn subordinates(self) -> Vec<RoleLevel> {
        Self::iter().filter(|r| *r < self).collect()
    }

    /// Whether a member at this level may manage a member (or their secrets) at `target`.
    ///
    /// Informational only: the server enforces management rights.
    pub fn can_manage(self, target: RoleLevel) -> bool {
        self > target
    }
}

impl TryFrom<u8> for RoleLevel {
    type Error = NcryptError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<RoleLevel> for u8 {
    fn from(role: RoleLevel) -> u8 {
        role.level()
    }
}

/// Bearer token returned by the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthToken {
    /// Value for the `Authorization` header, e.g. `Bearer abc`.
    pub fn header_value(&self) -> String {
        let scheme = if self.token_type.eq_ignore_ascii_case("bearer") || self.token_type.is_empty() {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{scheme} {}", self.access_token)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_levels_cover_one_to_seven() {
        let levels: Vec<u8> = RoleLevel::iter().map(RoleLevel::level).collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(RoleLevel::MIN.level(), 1);
        assert_eq!(RoleLevel::MAX.level(), 7);
    }

    #[test]
    fn role_level_rejects_out_of_range() {
        assert!(RoleLevel::new(0).is_err());
        assert!(RoleLevel::new(8).is_err());
        assert_eq!(RoleLevel::new(4).unwrap(), RoleLevel::Manager);
    }

    #[test]
    fn role_level_name_roundtrip() {
        for role in RoleLevel::iter() {
            let parsed = RoleLevel::from_str(&role.to_string()).expect("should parse back");
            assert_eq!(role, parsed);
        }
        assert_eq!(RoleLevel::Exec.to_string(), "Exec");
    }

    #[test]
    fn role_level_serializes_as_integer() {
        let json = serde_json::to_string(&RoleLevel::Director).unwrap();
        assert_eq!(json, "5");
        let parsed: RoleLevel = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, RoleLevel::Junior);
        assert!(serde_json::from_str::<RoleLevel>("9").is_err());
    }

    #[test]
    fn management_is_strictly_greater() {
        assert!(RoleLevel::Owner.can_manage(RoleLevel::Exec));
        assert!(!RoleLevel::Senior.can_manage(RoleLevel::Senior));
        assert_eq!(
            RoleLevel::Senior.subordinates(),
            vec![RoleLevel::Intern, RoleLevel::Junior]
        );
    }

    #[test]
    fn auth_token_header_and_redaction() {
        let token = AuthToken {
            access_token: "abc.def".into(),
            token_type: "bearer".into(),
        };
        assert_eq!(token.header_value(), "Bearer abc.def");
        assert!(!format!("{token:?}").contains("abc.def"));
    }
}
