//! Maps lifecycle events to the users who should hear about them.

use crate::notification::{
    domain::{LifecycleEvent, UserProfile},
    ports::{DirectoryError, DirectoryService},
};
use crate::task::domain::{Role, Task, UserId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Directory-backed recipient group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientGroup {
    /// Every admin in the organization.
    Admins,
    /// Managers of the task's department.
    DepartmentManagers,
}

impl fmt::Display for RecipientGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admins => f.write_str("admins"),
            Self::DepartmentManagers => f.write_str("department managers"),
        }
    }
}

/// A recipient group that could not be resolved.
#[derive(Debug, Clone, Error)]
#[error("could not resolve {group}: {source}")]
pub struct RecipientResolutionPartialFailure {
    /// Group that was skipped.
    pub group: RecipientGroup,
    /// Directory failure.
    pub source: DirectoryError,
}

/// Recipients of one event.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Users who receive the event's primary message.
    pub recipients: BTreeSet<UserId>,
    /// Users who receive the observer message.
    pub observers: BTreeSet<UserId>,
    /// Groups skipped because the directory failed.
    pub failures: Vec<RecipientResolutionPartialFailure>,
}

impl Resolution {
    /// Returns `true` when nobody is to be notified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty() && self.observers.is_empty()
    }
}

/// Resolves event recipients against the user directory.
pub struct RecipientResolver<D>
where
    D: DirectoryService,
{
    directory: Arc<D>,
}

impl<D> Clone for RecipientResolver<D>
where
    D: DirectoryService,
{
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D> RecipientResolver<D>
where
    D: DirectoryService,
{
    /// Creates a resolver over `directory`.
    #[must_use]
    pub const fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Returns the deduplicated recipients of `event` on `task`.
    ///
    /// A directory failure drops only the affected group; it is logged and
    /// recorded in [`Resolution::failures`].
    pub async fn resolve(&self, task: &Task, event: &LifecycleEvent) -> Resolution {
        let mut resolution = Resolution::default();
        match event {
            LifecycleEvent::Created => {
                self.add_group(task, RecipientGroup::Admins, &mut resolution)
                    .await;
                self.add_group(task, RecipientGroup::DepartmentManagers, &mut resolution)
                    .await;
                resolution.recipients.extend(task.assignees().iter().cloned());
            }
            LifecycleEvent::CompletionRequested { .. } => {
                self.add_group(task, RecipientGroup::DepartmentManagers, &mut resolution)
                    .await;
                self.add_group(task, RecipientGroup::Admins, &mut resolution)
                    .await;
            }
            LifecycleEvent::Approved { assignee, decider } => {
                resolution.recipients.insert(assignee.clone());
                match self.list_group(task, RecipientGroup::Admins).await {
                    Ok(admins) => resolution.observers.extend(
                        admins
                            .into_iter()
                            .map(|admin| admin.id)
                            .filter(|id| id != assignee && Some(id) != decider.as_ref()),
                    ),
                    Err(failure) => resolution.failures.push(failure),
                }
            }
            LifecycleEvent::Rejected { assignee } => {
                resolution.recipients.insert(assignee.clone());
            }
            LifecycleEvent::DueSoon => {
                resolution.recipients.extend(task.assignees().iter().cloned());
            }
        }
        resolution
    }

    /// Returns `user`'s display name, or the raw identifier when the
    /// directory has no usable name.
    pub async fn display_name(&self, user: &UserId) -> String {
        match self.directory.get_user(user).await {
            Ok(Some(profile)) => profile.display_name().to_owned(),
            Ok(None) => user.as_str().to_owned(),
            Err(err) => {
                warn!(uid = %user, error = %err, "display name lookup failed");
                user.as_str().to_owned()
            }
        }
    }

    async fn add_group(&self, task: &Task, group: RecipientGroup, resolution: &mut Resolution) {
        match self.list_group(task, group).await {
            Ok(users) => resolution
                .recipients
                .extend(users.into_iter().map(|user| user.id)),
            Err(failure) => resolution.failures.push(failure),
        }
    }

    async fn list_group(
        &self,
        task: &Task,
        group: RecipientGroup,
    ) -> Result<Vec<UserProfile>, RecipientResolutionPartialFailure> {
        let result = match group {
            RecipientGroup::Admins => self.directory.list_users_by_role(Role::Admin).await,
            RecipientGroup::DepartmentManagers => {
                self.directory
                    .list_users_by_department_and_role(task.department_id(), Role::Manager)
                    .await
            }
        };
        result.map_err(|source| {
            warn!(task_id = %task.id(), %group, error = %source, "recipient group unavailable");
            RecipientResolutionPartialFailure { group, source }
        })
    }
}
