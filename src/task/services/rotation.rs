//! Archive-and-reset handling for completed recurring tasks.

use crate::task::{
    domain::{Task, TaskDomainError, TaskId, TaskStatus},
    ports::{RotationOutcome, TaskRepository, TaskRepositoryError},
};
use chrono::FixedOffset;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while rotating a recurring task.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The task has no recurrence schedule.
    #[error("task {0} does not recur")]
    NotRecurring(TaskId),

    /// The task has not reached aggregate completion.
    #[error("task {0} is not completed")]
    NotCompleted(TaskId),

    /// The completion was already rotated; nothing was written.
    #[error("task {0} was already rotated for this completion")]
    AlreadyRotated(TaskId),

    /// The archive-and-reset transaction failed; the live task is unchanged.
    #[error("failed to archive task {task_id}: {source}")]
    ArchiveFailed {
        /// Task being rotated.
        task_id: TaskId,
        /// Underlying repository failure.
        source: TaskRepositoryError,
    },

    /// The next deadline could not be computed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Looking up an earlier archival copy failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Rotates completed recurring tasks into their next occurrence.
#[derive(Clone)]
pub struct RecurrenceRotationEngine<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    offset: FixedOffset,
}

impl<R, C> RecurrenceRotationEngine<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates an engine evaluating calendars in `offset`.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, offset: FixedOffset) -> Self {
        Self {
            repository,
            clock,
            offset,
        }
    }

    /// Archives `completed` and reopens it with its next deadline.
    ///
    /// `completed` is the snapshot that reached aggregate completion. When an
    /// archival copy for the same completion already exists, it is reused
    /// and only the reset is applied.
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::AlreadyRotated`] when the live task no longer
    /// holds this completion, and [`RotationError::ArchiveFailed`] when the
    /// transaction fails, leaving the live task unchanged.
    pub async fn rotate(&self, completed: &Task) -> Result<Task, RotationError> {
        let task_id = completed.id();
        if !completed.is_recurring() {
            return Err(RotationError::NotRecurring(task_id));
        }
        let completed_at = match (completed.status(), completed.completed_at()) {
            (TaskStatus::Completed, Some(completed_at)) => completed_at,
            _ => return Err(RotationError::NotCompleted(task_id)),
        };

        let mut plan = completed.plan_rotation(self.offset, self.clock.utc())?;
        if let Some(existing) = self
            .repository
            .find_archived_copy(task_id, completed_at)
            .await?
        {
            debug!(task_id = %task_id, archive_id = %existing.id(), "reusing archival copy");
            plan.archive = existing;
        }

        match self.repository.rotate(task_id, &plan).await {
            Ok(RotationOutcome::Rotated {
                task,
                archive_written,
            }) => {
                info!(
                    task_id = %task_id,
                    archive_id = %plan.archive.id(),
                    archive_written,
                    next_deadline = %plan.next_deadline,
                    "rotated recurring task"
                );
                Ok(task)
            }
            Ok(RotationOutcome::Superseded) => {
                debug!(task_id = %task_id, "completion already rotated");
                Err(RotationError::AlreadyRotated(task_id))
            }
            Err(source) => {
                warn!(task_id = %task_id, error = %source, "rotation transaction failed");
                Err(RotationError::ArchiveFailed { task_id, source })
            }
        }
    }
}
