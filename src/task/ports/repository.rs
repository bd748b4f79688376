//! Repository port for task persistence, approval updates and rotation.

use crate::task::domain::{Actor, ApprovalUpdate, RotationPlan, Task, TaskDomainError, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Outcome of a rotation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The archive exists and the live task reopened.
    Rotated {
        /// Live task after the reset.
        task: Task,
        /// `false` when an archival copy from an earlier attempt was reused.
        archive_written: bool,
    },
    /// The live task no longer holds the completion the plan was built from.
    Superseded,
}

/// Task persistence contract.
///
/// Implementations serialize writes per task: approval updates are
/// compare-and-swap on a single approval entry, and rotation is one
/// all-or-nothing transaction.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Replaces an existing task document.
    ///
    /// Concurrent approval writes made since `task` was read are lost, so
    /// lifecycle transitions use the field-level operations instead.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Applies a single approval change if the stored state still matches
    /// `update.expected`, recomputing aggregate status from the written
    /// state, and returns the updated task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is missing and
    /// [`TaskRepositoryError::Conflict`] when the approval changed since it
    /// was read.
    async fn apply_approval(
        &self,
        id: TaskId,
        update: &ApprovalUpdate,
    ) -> TaskRepositoryResult<Task>;

    /// Sets the deletion flag on behalf of `actor`, leaving approvals and
    /// every other field as stored, and returns the updated task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is missing and
    /// [`TaskRepositoryError::Conflict`] when `actor` may not delete it.
    async fn mark_deleted(
        &self,
        id: TaskId,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task>;

    /// Writes the archival copy and reopens the live task atomically.
    ///
    /// An archival copy already stored under the plan's identifier is reused
    /// rather than written twice.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError`] when either write fails; in that case
    /// neither is applied.
    async fn rotate(&self, id: TaskId, plan: &RotationPlan) -> TaskRepositoryResult<RotationOutcome>;

    /// Finds the archival copy of `original` completed at `completed_at`.
    async fn find_archived_copy(
        &self,
        original: TaskId,
        completed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Returns open, active tasks whose effective deadline lies in
    /// `(after, until]`.
    ///
    /// Recurring records without a stored deadline are recomputed from their
    /// rule as seen at `after` in the organization's `offset`.
    async fn find_open_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: FixedOffset,
    ) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A concurrent writer changed the task first.
    #[error("conflicting update on task {task_id}: {source}")]
    Conflict {
        /// Contended task.
        task_id: TaskId,
        /// Domain check that failed at write time.
        source: TaskDomainError,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
