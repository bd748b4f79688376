//! Organizational roles and the actors that carry them.

use super::{ParseValueError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role held by a user in the organization directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Organization-wide administrator.
    Admin,
    /// Department manager.
    Manager,
    /// May assign work but not decide on it.
    Assigner,
    /// Regular staff member.
    Staff,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Assigner => "assigner",
            Self::Staff => "staff",
        }
    }

    /// Returns `true` when the role may approve or reject completion requests.
    #[must_use]
    pub const fn can_decide(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Returns `true` when the role may assign work to other users.
    #[must_use]
    pub const fn can_assign_others(self) -> bool {
        !matches!(self, Self::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "assigner" => Ok(Self::Assigner),
            "staff" => Ok(Self::Staff),
            _ => Err(ParseValueError::new("role", value)),
        }
    }
}

/// A user acting on a task together with the role they act under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the role the user acts under.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

/// Manager or admin verdict on a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Accept the assignee's work.
    Approve,
    /// Send the work back to the assignee.
    Reject,
}
