//! In-memory user directory.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::notification::{
    domain::UserProfile,
    ports::{DirectoryError, DirectoryResult, DirectoryService},
};
use crate::task::domain::{DepartmentId, Role, UserId};

/// Thread-safe in-memory directory keyed by user identifier.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<BTreeMap<UserId, UserProfile>>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the lock is poisoned.
    pub fn insert(&self, profile: UserProfile) -> DirectoryResult<()> {
        self.users
            .write()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?
            .insert(profile.id.clone(), profile);
        Ok(())
    }

    fn select(&self, filter: impl Fn(&UserProfile) -> bool) -> DirectoryResult<Vec<UserProfile>> {
        let users = self
            .users
            .read()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(users.values().filter(|user| filter(user)).cloned().collect())
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectory {
    async fn list_users_by_role(&self, role: Role) -> DirectoryResult<Vec<UserProfile>> {
        self.select(|user| user.role == role)
    }

    async fn list_users_by_department_and_role(
        &self,
        department: &DepartmentId,
        role: Role,
    ) -> DirectoryResult<Vec<UserProfile>> {
        self.select(|user| user.role == role && user.department_id.as_ref() == Some(department))
    }

    async fn get_user(&self, id: &UserId) -> DirectoryResult<Option<UserProfile>> {
        Ok(self.select(|user| &user.id == id)?.into_iter().next())
    }
}
