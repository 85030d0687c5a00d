//! Caller identity
//!
//! Requests carry a `Caller` rather than loose user/role strings so that
//! authorization checks can match exhaustively on who is asking.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform role, closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Platform administrator
    Admin,
    /// Event organizer
    Organizer,
    /// Judge
    Judge,
    /// Regular participant
    Participant,
}

impl UserRole {
    /// Roles that bypass team-level authorization checks
    pub fn is_privileged(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Organizer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Organizer => "organizer",
            UserRole::Judge => "judge",
            UserRole::Participant => "participant",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "organizer" => Ok(UserRole::Organizer),
            "judge" => Ok(UserRole::Judge),
            "participant" => Ok(UserRole::Participant),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The identity behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No session token presented
    Anonymous,
    /// Validated session
    Authenticated { user_id: Uuid, role: UserRole },
}

impl Caller {
    pub fn authenticated(user_id: Uuid, role: UserRole) -> Self {
        Caller::Authenticated { user_id, role }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    /// Whether the caller bypasses team-level checks
    pub fn is_privileged(&self) -> bool {
        match self {
            Caller::Anonymous => false,
            Caller::Authenticated { role, .. } => role.is_privileged(),
        }
    }
}
