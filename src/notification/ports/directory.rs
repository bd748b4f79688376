//! Directory port for looking up users and their push tokens.

use crate::notification::domain::UserProfile;
use crate::task::domain::{DepartmentId, Role, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read access to the organization's users.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Lists every user holding `role`.
    async fn list_users_by_role(&self, role: Role) -> DirectoryResult<Vec<UserProfile>>;

    /// Lists users of `department` holding `role`.
    async fn list_users_by_department_and_role(
        &self,
        department: &DepartmentId,
        role: Role,
    ) -> DirectoryResult<Vec<UserProfile>>;

    /// Fetches one user. Returns `None` when the user is unknown.
    async fn get_user(&self, id: &UserId) -> DirectoryResult<Option<UserProfile>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The directory could not be queried.
    #[error("directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
