//! Membership status flag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Operator-controlled status of a membership record.
///
/// Status alone does not grant access: an `Active` record whose end date
/// has passed is still expired. See [`super::MembershipRecord::entitlement_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[default]
    Active,
    Inactive,
}

impl MembershipStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(MembershipStatus::Active),
            "inactive" => Ok(MembershipStatus::Inactive),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("expected 'active' or 'inactive', got '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_active() {
        assert_eq!(MembershipStatus::default(), MembershipStatus::Active);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ACTIVE".parse::<MembershipStatus>().unwrap(), MembershipStatus::Active);
        assert_eq!("inactive".parse::<MembershipStatus>().unwrap(), MembershipStatus::Inactive);
        assert!("paused".parse::<MembershipStatus>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&MembershipStatus::Inactive).unwrap();
        assert_eq!(json, "\"inactive\"");
    }
}
