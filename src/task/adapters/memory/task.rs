//! In-memory task repository for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::task::{
    domain::{Actor, ApprovalUpdate, RotationPlan, Task, TaskId, TaskStatus, effective_deadline},
    ports::{
        RotationOutcome, TaskChange, TaskChangeReceiver, TaskChangeSender, TaskRepository,
        TaskRepositoryError, TaskRepositoryResult, change_feed,
    },
};

/// Thread-safe in-memory task repository.
///
/// A single lock guards the whole collection, which gives every write the
/// per-document serialization the port requires. When built with
/// [`InMemoryTaskRepository::with_change_feed`], each committed write is
/// published as a [`TaskChange`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
    changes: Option<TaskChangeSender>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository together with the receiving end of its
    /// change feed.
    #[must_use]
    pub fn with_change_feed() -> (Self, TaskChangeReceiver) {
        let (sender, receiver) = change_feed();
        let repository = Self {
            tasks: Arc::default(),
            changes: Some(sender),
        };
        (repository, receiver)
    }

    /// Returns every stored task, archived and deleted ones included.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is poisoned.
    pub fn all(&self) -> TaskRepositoryResult<Vec<Task>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, HashMap<TaskId, Task>>> {
        self.tasks.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, HashMap<TaskId, Task>>> {
        self.tasks.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn publish(&self, change: TaskChange) {
        if let Some(sender) = &self.changes {
            if sender.send(change).is_err() {
                debug!("task change feed closed, dropping change");
            }
        }
    }

    fn publish_update(&self, before: Task, after: &Task) {
        self.publish(TaskChange::Updated {
            before: Box::new(before),
            after: Box::new(after.clone()),
        });
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        {
            let mut tasks = self.write()?;
            if tasks.contains_key(&task.id()) {
                return Err(TaskRepositoryError::DuplicateTask(task.id()));
            }
            tasks.insert(task.id(), task.clone());
        }
        self.publish(TaskChange::Created(task.clone()));
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let before = {
            let mut tasks = self.write()?;
            let previous = tasks
                .get(&task.id())
                .ok_or(TaskRepositoryError::NotFound(task.id()))?
                .clone();
            tasks.insert(task.id(), task.clone());
            previous
        };
        self.publish_update(before, task);
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn apply_approval(
        &self,
        id: TaskId,
        update: &ApprovalUpdate,
    ) -> TaskRepositoryResult<Task> {
        let (before, after) = {
            let mut tasks = self.write()?;
            let task = tasks.get_mut(&id).ok_or(TaskRepositoryError::NotFound(id))?;
            let before = task.clone();
            task.apply_approval(update)
                .map_err(|source| TaskRepositoryError::Conflict { task_id: id, source })?;
            (before, task.clone())
        };
        self.publish_update(before, &after);
        Ok(after)
    }

    async fn mark_deleted(
        &self,
        id: TaskId,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        let (before, after) = {
            let mut tasks = self.write()?;
            let task = tasks.get_mut(&id).ok_or(TaskRepositoryError::NotFound(id))?;
            let before = task.clone();
            task.delete_at(actor, at)
                .map_err(|source| TaskRepositoryError::Conflict { task_id: id, source })?;
            (before, task.clone())
        };
        self.publish_update(before, &after);
        Ok(after)
    }

    async fn rotate(&self, id: TaskId, plan: &RotationPlan) -> TaskRepositoryResult<RotationOutcome> {
        let (before, after, archive_written) = {
            let mut tasks = self.write()?;
            let live = tasks.get(&id).ok_or(TaskRepositoryError::NotFound(id))?;
            if live.status() != TaskStatus::Completed
                || live.completed_at() != Some(plan.completed_at)
            {
                return Ok(RotationOutcome::Superseded);
            }
            let before = live.clone();
            let mut after = live.clone();
            after.apply_rotation(plan);

            let archive_id = plan.archive.id();
            let archive_written = !tasks.contains_key(&archive_id);
            if archive_written {
                tasks.insert(archive_id, plan.archive.clone());
            }
            tasks.insert(id, after.clone());
            (before, after, archive_written)
        };

        if archive_written {
            self.publish(TaskChange::Created(plan.archive.clone()));
        }
        self.publish_update(before, &after);
        Ok(RotationOutcome::Rotated {
            task: after,
            archive_written,
        })
    }

    async fn find_archived_copy(
        &self,
        original: TaskId,
        completed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.read()?;
        Ok(tasks
            .values()
            .find(|task| {
                task.is_archived()
                    && task.original_task_id() == Some(original)
                    && task.completed_at() == Some(completed_at)
            })
            .cloned())
    }

    async fn find_open_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: FixedOffset,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.read()?;
        let mut due: Vec<(DateTime<Utc>, Task)> = tasks
            .values()
            .filter(|task| task.is_active() && task.status() == TaskStatus::Open)
            .filter_map(|task| {
                effective_deadline(task, after, offset)
                    .filter(|deadline| *deadline > after && *deadline <= until)
                    .map(|deadline| (deadline, task.clone()))
            })
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);
        Ok(due.into_iter().map(|(_, task)| task).collect())
    }
}
