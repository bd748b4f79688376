//! Directory view of a user.

use crate::task::domain::{DepartmentId, Role, UserId};
use serde::{Deserialize, Serialize};

/// User record as seen by the notification engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name; may be blank.
    pub full_name: String,
    /// Organizational role.
    pub role: Role,
    /// Department, if the user belongs to one.
    pub department_id: Option<DepartmentId>,
    /// Registered push tokens.
    pub push_tokens: Vec<String>,
}

impl UserProfile {
    /// Creates a profile with no department and no push tokens.
    #[must_use]
    pub fn new(id: UserId, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            role,
            department_id: None,
            push_tokens: Vec::new(),
        }
    }

    /// Sets the department.
    #[must_use]
    pub fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// Sets the push tokens.
    #[must_use]
    pub fn with_push_tokens(mut self, tokens: impl IntoIterator<Item = String>) -> Self {
        self.push_tokens = tokens.into_iter().collect();
        self
    }

    /// Returns the full name, or the user identifier when the name is blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let name = self.full_name.trim();
        if name.is_empty() {
            self.id.as_str()
        } else {
            name
        }
    }
}
