//! Caller identity as seen by the ledger.
//!
//! Authentication happens upstream in the identity provider. By the time a
//! request reaches the ledger it carries only a member id and a role flag,
//! packaged here as an [`Actor`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{MemberId, ValidationError};

/// Role flag supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Club staff: may mutate any member's ledger.
    Admin,
    /// Regular member: may read their own ledger only.
    #[default]
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "staff" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Authenticated caller of a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub member_id: MemberId,
    pub role: Role,
}

impl Actor {
    pub fn new(member_id: MemberId, role: Role) -> Self {
        Self { member_id, role }
    }

    pub fn admin(member_id: MemberId) -> Self {
        Self::new(member_id, Role::Admin)
    }

    pub fn member(member_id: MemberId) -> Self {
        Self::new(member_id, Role::Member)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins see every member; members see only themselves.
    pub fn can_view(&self, member_id: &MemberId) -> bool {
        self.is_admin() || &self.member_id == member_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    #[test]
    fn role_parses_known_values() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Staff".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" member ".parse::<Role>().unwrap(), Role::Member);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn admin_can_view_anyone() {
        let actor = Actor::admin(member("staff-1"));
        assert!(actor.can_view(&member("m-9")));
    }

    #[test]
    fn member_can_view_only_self() {
        let actor = Actor::member(member("m-1"));
        assert!(actor.can_view(&member("m-1")));
        assert!(!actor.can_view(&member("m-2")));
        assert!(!actor.is_admin());
    }
}
