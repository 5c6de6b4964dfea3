//! Play session lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle of a single play session.
///
/// `Active` moves to `Completed` exactly once. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaySessionStatus {
    #[default]
    Active,
    Completed,
}

impl PlaySessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaySessionStatus::Active => "active",
            PlaySessionStatus::Completed => "completed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PlaySessionStatus::Active)
    }
}

impl StateMachine for PlaySessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (PlaySessionStatus::Active, PlaySessionStatus::Completed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            PlaySessionStatus::Active => vec![PlaySessionStatus::Completed],
            PlaySessionStatus::Completed => vec![],
        }
    }
}

impl fmt::Display for PlaySessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaySessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(PlaySessionStatus::Active),
            "completed" => Ok(PlaySessionStatus::Completed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("expected 'active' or 'completed', got '{}'", other),
            )),
        }
    }
}
