//! Service layer for task creation and approval transitions.

use super::rotation::{RecurrenceRotationEngine, RotationError};
use crate::config::LifecycleConfig;
use crate::task::{
    domain::{
        Actor, Decision, DepartmentId, OccurrenceMode, Priority, RecurrenceRule, Task, TaskAction,
        TaskDomainError, TaskDraft, TaskId, TaskSchedule, UserId, next_occurrence_at,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, NaiveTime, Utc};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Requested time model for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleRequest {
    /// Due at a single instant.
    Fixed {
        /// Due instant.
        due_at: DateTime<Utc>,
    },
    /// Worked on between two instants.
    Range {
        /// Range start.
        from: DateTime<Utc>,
        /// Range end.
        to: DateTime<Utc>,
    },
    /// Repeats according to `rule`.
    Recurrence {
        /// Recurrence pattern.
        rule: RecurrenceRule,
        /// Local due time; end of day when absent.
        time_of_day: Option<NaiveTime>,
    },
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    creator: Actor,
    title: String,
    content: String,
    department_id: DepartmentId,
    schedule: ScheduleRequest,
    priority: Priority,
    alert_flag: bool,
    assignees: BTreeSet<UserId>,
    supervisor_id: Option<UserId>,
    is_recurring_template: bool,
    parent_task_id: Option<TaskId>,
}

impl CreateTaskRequest {
    /// Creates a request with required fields.
    #[must_use]
    pub fn new(
        creator: Actor,
        title: impl Into<String>,
        department_id: DepartmentId,
        schedule: ScheduleRequest,
    ) -> Self {
        Self {
            creator,
            title: title.into(),
            content: String::new(),
            department_id,
            schedule,
            priority: Priority::default(),
            alert_flag: false,
            assignees: BTreeSet::new(),
            supervisor_id: None,
            is_recurring_template: false,
            parent_task_id: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the manual urgency flag.
    #[must_use]
    pub const fn with_alert_flag(mut self, alert_flag: bool) -> Self {
        self.alert_flag = alert_flag;
        self
    }

    /// Sets the assignees. Duplicates collapse.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = UserId>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    /// Sets the supervisor.
    #[must_use]
    pub fn with_supervisor(mut self, supervisor_id: UserId) -> Self {
        self.supervisor_id = Some(supervisor_id);
        self
    }

    /// Marks the task as a recurring definition rather than work.
    #[must_use]
    pub const fn as_recurring_template(mut self) -> Self {
        self.is_recurring_template = true;
        self
    }

    /// Links the task to the template it was spawned from.
    #[must_use]
    pub const fn with_parent(mut self, parent_task_id: TaskId) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation or a state-machine check failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
    /// The task completed but could not be rotated.
    #[error("rotation failed: {0}")]
    RotationFailed(#[from] RotationError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

impl From<TaskRepositoryError> for TaskLifecycleError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::Conflict { source, .. } => Self::Domain(source),
            TaskRepositoryError::NotFound(task_id) => Self::NotFound(task_id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    config: LifecycleConfig,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            config: LifecycleConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Validates and stores a new task with empty approvals.
    ///
    /// Staff may only assign tasks to themselves. Recurring tasks receive
    /// their first deadline, counting today when it matches the rule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when validation or the role
    /// check fails, and [`TaskLifecycleError::Repository`] when the task
    /// cannot be stored.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let now = self.clock.utc();
        let offset = self.config.utc_offset();
        let (schedule, first_deadline) = match request.schedule {
            ScheduleRequest::Fixed { due_at } => (TaskSchedule::Fixed { due_at }, None),
            ScheduleRequest::Range { from, to } => (TaskSchedule::range(from, to)?, None),
            ScheduleRequest::Recurrence { rule, time_of_day } => {
                let first =
                    next_occurrence_at(&rule, now, time_of_day, OccurrenceMode::Inclusive, offset);
                let schedule = TaskSchedule::Recurrence {
                    rule,
                    next_deadline: None,
                };
                (schedule, first)
            }
        };

        let creator = request.creator;
        let draft = TaskDraft {
            title: request.title,
            content: request.content,
            schedule,
            priority: request.priority,
            alert_flag: request.alert_flag,
            assignees: request.assignees,
            supervisor_id: request.supervisor_id,
            department_id: request.department_id,
            created_by: creator.user_id().clone(),
            is_recurring_template: request.is_recurring_template,
            parent_task_id: request.parent_task_id,
        };
        let mut task = Task::new(draft, &*self.clock)?;

        let assigns_only_self =
            task.assignees().iter().all(|assignee| assignee == creator.user_id());
        if !creator.role().can_assign_others() && !assigns_only_self {
            return Err(TaskDomainError::Unauthorized {
                task_id: task.id(),
                role: creator.role(),
                action: TaskAction::Create,
            }
            .into());
        }
        if task.is_recurring() {
            let deadline = first_deadline.ok_or(TaskDomainError::DeadlineOutOfRange(task.id()))?;
            task.initialize_deadline(deadline);
        }

        self.repository.store(&task).await?;
        info!(task_id = %task.id(), uid = %creator.user_id(), "task created");
        Ok(task)
    }

    /// Records a completion request by `assignee`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks and
    /// [`TaskLifecycleError::Domain`] when the transition is not allowed,
    /// including when a concurrent writer changed the approval first.
    pub async fn request_completion(
        &self,
        task_id: TaskId,
        assignee: &UserId,
    ) -> TaskLifecycleResult<Task> {
        let task = self.load(task_id).await?;
        let update = task.plan_completion_request(assignee, self.clock.utc())?;
        let updated = self.repository.apply_approval(task_id, &update).await?;
        info!(task_id = %task_id, uid = %assignee, "completion requested");
        Ok(updated)
    }

    /// Approves or rejects `assignee`'s pending request.
    ///
    /// When the approval completes a recurring task, the task is rotated
    /// before this returns and the reopened task is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the decider's role or the
    /// approval state forbid the decision, and
    /// [`TaskLifecycleError::RotationFailed`] when the completed task could
    /// not be rotated. In the latter case the approval stays recorded and
    /// [`TaskLifecycleService::complete_rotation`] may be retried.
    pub async fn decide(
        &self,
        task_id: TaskId,
        assignee: &UserId,
        decision: Decision,
        decider: &Actor,
    ) -> TaskLifecycleResult<Task> {
        let task = self.load(task_id).await?;
        let update = task.plan_decision(assignee, decision, decider, self.clock.utc())?;
        let updated = self.repository.apply_approval(task_id, &update).await?;
        info!(
            task_id = %task_id,
            uid = %assignee,
            decider = %decider.user_id(),
            state = %update.next,
            status = updated.status().as_str(),
            "completion decided"
        );

        if updated.requires_rotation() {
            return Ok(self.rotation_engine().rotate(&updated).await?);
        }
        Ok(updated)
    }

    /// Retries the rotation of a completed recurring task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::RotationFailed`] when the task is not a
    /// completed recurring task or the rotation fails again.
    pub async fn complete_rotation(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let task = self.load(task_id).await?;
        Ok(self.rotation_engine().rotate(&task).await?)
    }

    /// Marks a task deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] unless the actor created the
    /// task or is an admin.
    pub async fn soft_delete(&self, task_id: TaskId, actor: &Actor) -> TaskLifecycleResult<Task> {
        self.load(task_id).await?.authorize_delete(actor)?;
        let deleted = self
            .repository
            .mark_deleted(task_id, actor, self.clock.utc())
            .await?;
        info!(task_id = %task_id, uid = %actor.user_id(), "task deleted");
        Ok(deleted)
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn find_by_id(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    async fn load(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    fn rotation_engine(&self) -> RecurrenceRotationEngine<R, C> {
        RecurrenceRotationEngine::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.clock),
            self.config.utc_offset(),
        )
    }
}
