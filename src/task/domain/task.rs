//! Task aggregate root and its approval state machine.

use super::{
    Actor, ApprovalState, ApprovalUpdate, Approvals, Decision, DepartmentId, OccurrenceMode,
    ParseValueError, Role, TaskAction, TaskDomainError, TaskId, TaskSchedule, TransitionRejection,
    UserId, local_time_of, next_occurrence_at,
};
use chrono::{DateTime, FixedOffset, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aggregate task status derived from the approvals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// At least one assignee is not approved.
    #[default]
    Open,
    /// Every assignee is approved.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseValueError::new("task status", value)),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Normal priority.
    #[default]
    Normal,
    /// High priority.
    High,
}

impl TryFrom<&str> for Priority {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" | "urgent" => Ok(Self::High),
            _ => Err(ParseValueError::new("priority", value)),
        }
    }
}

/// Validated inputs for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task title.
    pub title: String,
    /// Free-text description.
    pub content: String,
    /// Time model.
    pub schedule: TaskSchedule,
    /// Priority.
    pub priority: Priority,
    /// Manual urgency override.
    pub alert_flag: bool,
    /// Users who must each approve completion.
    pub assignees: BTreeSet<UserId>,
    /// Optional observer.
    pub supervisor_id: Option<UserId>,
    /// Owning department.
    pub department_id: DepartmentId,
    /// Creating user.
    pub created_by: UserId,
    /// Whether the record is a recurring definition rather than work.
    pub is_recurring_template: bool,
    /// Template this instance was spawned from.
    pub parent_task_id: Option<TaskId>,
}

/// Archive-and-reset unit applied when a recurring task completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    /// Immutable snapshot of the completed instance.
    pub archive: Task,
    /// Completion instant the plan was derived from.
    pub completed_at: DateTime<Utc>,
    /// Deadline the live task reopens with.
    pub next_deadline: DateTime<Utc>,
    /// Time the rotation is applied.
    pub rotated_at: DateTime<Utc>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    content: String,
    schedule: TaskSchedule,
    priority: Priority,
    alert_flag: bool,
    assignees: BTreeSet<UserId>,
    supervisor_id: Option<UserId>,
    approvals: Approvals,
    status: TaskStatus,
    is_recurring_template: bool,
    original_task_id: Option<TaskId>,
    parent_task_id: Option<TaskId>,
    is_archived: bool,
    is_deleted: bool,
    department_id: DepartmentId,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    revision: u64,
}

impl Task {
    /// Creates an open task with no approvals.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the title is blank, there are no
    /// assignees, or the schedule is invalid.
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if draft.assignees.is_empty() {
            return Err(TaskDomainError::NoAssignees);
        }
        draft.schedule.validate()?;

        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title: title.to_owned(),
            content: draft.content,
            schedule: draft.schedule,
            priority: draft.priority,
            alert_flag: draft.alert_flag,
            assignees: draft.assignees,
            supervisor_id: draft.supervisor_id,
            approvals: Approvals::new(),
            status: TaskStatus::Open,
            is_recurring_template: draft.is_recurring_template,
            original_task_id: None,
            parent_task_id: draft.parent_task_id,
            is_archived: false,
            is_deleted: false,
            department_id: draft.department_id,
            created_by: draft.created_by,
            created_at: timestamp,
            updated_at: timestamp,
            completed_at: None,
            revision: 0,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the time model.
    #[must_use]
    pub const fn schedule(&self) -> &TaskSchedule {
        &self.schedule
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the manual urgency flag.
    #[must_use]
    pub const fn alert_flag(&self) -> bool {
        self.alert_flag
    }

    /// Returns the assignees.
    #[must_use]
    pub const fn assignees(&self) -> &BTreeSet<UserId> {
        &self.assignees
    }

    /// Returns the supervisor, if any.
    #[must_use]
    pub const fn supervisor_id(&self) -> Option<&UserId> {
        self.supervisor_id.as_ref()
    }

    /// Returns the approval records.
    #[must_use]
    pub const fn approvals(&self) -> &Approvals {
        &self.approvals
    }

    /// Returns the approval state of `assignee`.
    #[must_use]
    pub fn approval_state(&self, assignee: &UserId) -> ApprovalState {
        self.approvals.state_of(assignee)
    }

    /// Returns the aggregate status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns `true` for recurring definitions.
    #[must_use]
    pub const fn is_recurring_template(&self) -> bool {
        self.is_recurring_template
    }

    /// Returns the live task an archival copy was taken from.
    #[must_use]
    pub const fn original_task_id(&self) -> Option<TaskId> {
        self.original_task_id
    }

    /// Returns the template a spawned instance belongs to.
    #[must_use]
    pub const fn parent_task_id(&self) -> Option<TaskId> {
        self.parent_task_id
    }

    /// Returns `true` for archival copies.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.is_archived
    }

    /// Returns `true` once soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Returns the owning department.
    #[must_use]
    pub const fn department_id(&self) -> &DepartmentId {
        &self.department_id
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> &UserId {
        &self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the write counter, bumped by every approval, rotation and
    /// deletion.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns when the task reached aggregate completion.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns `true` when the task appears in active views and notifications.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_archived && !self.is_deleted && !self.is_recurring_template
    }

    /// Returns `true` for tasks with a recurrence schedule.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        matches!(self.schedule, TaskSchedule::Recurrence { .. })
    }

    /// Returns `true` when the task completed and must rotate before the
    /// transition is finished.
    #[must_use]
    pub const fn requires_rotation(&self) -> bool {
        self.is_recurring() && matches!(self.status, TaskStatus::Completed) && !self.is_archived
    }

    /// Validates a completion request by `assignee` and returns the
    /// field-level update to persist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when `assignee` is not
    /// an assignee, is already pending or approved, or the task no longer
    /// accepts requests.
    pub fn plan_completion_request(
        &self,
        assignee: &UserId,
        at: DateTime<Utc>,
    ) -> Result<ApprovalUpdate, TaskDomainError> {
        self.ensure_accepts_transitions(assignee)?;
        let current = self.approvals.state_of(assignee);
        match current {
            ApprovalState::Unset | ApprovalState::Rejected => Ok(ApprovalUpdate {
                assignee_id: assignee.clone(),
                expected: current,
                observed_revision: self.approvals.revision_of(assignee),
                next: ApprovalState::Pending,
                decided_by: None,
                at,
            }),
            ApprovalState::Pending => Err(self.rejection(assignee, TransitionRejection::AlreadyPending)),
            ApprovalState::Approved => {
                Err(self.rejection(assignee, TransitionRejection::AlreadyApproved))
            }
        }
    }

    /// Validates a decision on `assignee`'s pending request and returns the
    /// field-level update to persist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Unauthorized`] when the decider is neither
    /// manager nor admin, and [`TaskDomainError::InvalidTransition`] when the
    /// request is not pending or the task no longer accepts decisions.
    pub fn plan_decision(
        &self,
        assignee: &UserId,
        decision: Decision,
        decider: &Actor,
        at: DateTime<Utc>,
    ) -> Result<ApprovalUpdate, TaskDomainError> {
        if !decider.role().can_decide() {
            return Err(TaskDomainError::Unauthorized {
                task_id: self.id,
                role: decider.role(),
                action: TaskAction::Decide,
            });
        }
        self.ensure_accepts_transitions(assignee)?;
        let current = self.approvals.state_of(assignee);
        if current != ApprovalState::Pending {
            return Err(self.rejection(assignee, TransitionRejection::NotPending(current)));
        }
        Ok(ApprovalUpdate {
            assignee_id: assignee.clone(),
            expected: current,
            observed_revision: self.approvals.revision_of(assignee),
            next: ApprovalState::from(decision),
            decided_by: Some(decider.user_id().clone()),
            at,
        })
    }

    /// Writes an approval update and recomputes the aggregate status from the
    /// resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the task stopped
    /// accepting transitions, or when the stored record no longer matches
    /// the state and revision the update was planned against.
    pub fn apply_approval(&mut self, update: &ApprovalUpdate) -> Result<(), TaskDomainError> {
        let assignee = &update.assignee_id;
        self.ensure_accepts_transitions(assignee)?;
        let found = self.approvals.state_of(assignee);
        if found != update.expected {
            return Err(self.rejection(
                assignee,
                TransitionRejection::StateChanged {
                    expected: update.expected,
                    found,
                },
            ));
        }
        if self.approvals.revision_of(assignee) != update.observed_revision {
            return Err(self.rejection(assignee, TransitionRejection::RecordReplaced));
        }
        self.revision += 1;
        self.approvals.apply(update, self.revision);
        self.updated_at = update.at;
        if self.approvals.all_approved(&self.assignees) {
            self.status = TaskStatus::Completed;
            self.completed_at = Some(update.at);
        } else {
            self.status = TaskStatus::Open;
        }
        Ok(())
    }

    /// Records a completion request by `assignee`.
    ///
    /// # Errors
    ///
    /// See [`Task::plan_completion_request`].
    pub fn request_completion(
        &mut self,
        assignee: &UserId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let update = self.plan_completion_request(assignee, clock.utc())?;
        self.apply_approval(&update)
    }

    /// Records a decision on `assignee`'s pending request.
    ///
    /// # Errors
    ///
    /// See [`Task::plan_decision`].
    pub fn decide(
        &mut self,
        assignee: &UserId,
        decision: Decision,
        decider: &Actor,
        clock: &impl Clock,
    ) -> Result<TaskStatus, TaskDomainError> {
        let update = self.plan_decision(assignee, decision, decider, clock.utc())?;
        self.apply_approval(&update)?;
        Ok(self.status)
    }

    /// Builds the archive-and-reset plan for a completed recurring task.
    ///
    /// The archival copy is titled with the local completion date and keyed
    /// by [`TaskId::archival`]. The new deadline is the next strict
    /// occurrence after completion, keeping the current deadline's local
    /// time of day.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the task is not a
    /// completed recurring task, or [`TaskDomainError::DeadlineOutOfRange`]
    /// when no next deadline exists.
    pub fn plan_rotation(
        &self,
        offset: FixedOffset,
        rotated_at: DateTime<Utc>,
    ) -> Result<RotationPlan, TaskDomainError> {
        let TaskSchedule::Recurrence {
            rule,
            next_deadline,
        } = &self.schedule
        else {
            return Err(self.rejection(&self.created_by, TransitionRejection::NotRecurring));
        };
        let completed_at = match (self.status, self.completed_at) {
            (TaskStatus::Completed, Some(completed_at)) => completed_at,
            _ => return Err(self.rejection(&self.created_by, TransitionRejection::NotCompleted)),
        };

        let time_of_day = next_deadline.map(|deadline| local_time_of(deadline, offset));
        let next = next_occurrence_at(
            rule,
            completed_at,
            time_of_day,
            OccurrenceMode::Strict,
            offset,
        )
        .ok_or(TaskDomainError::DeadlineOutOfRange(self.id))?;

        let mut archive = self.clone();
        archive.id = TaskId::archival(self.id, completed_at);
        archive.title = format!(
            "{} ({})",
            self.title,
            completed_at.with_timezone(&offset).format("%d/%m/%Y")
        );
        archive.is_archived = true;
        archive.is_recurring_template = false;
        archive.original_task_id = Some(self.id);
        archive.status = TaskStatus::Completed;
        archive.updated_at = rotated_at;

        Ok(RotationPlan {
            archive,
            completed_at,
            next_deadline: next,
            rotated_at,
        })
    }

    /// Reopens the task for its next occurrence.
    pub fn apply_rotation(&mut self, plan: &RotationPlan) {
        self.approvals.clear();
        self.status = TaskStatus::Open;
        self.completed_at = None;
        self.schedule.set_next_deadline(plan.next_deadline);
        self.updated_at = plan.rotated_at;
        self.revision += 1;
    }

    /// Marks the task deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Unauthorized`] unless the actor created the
    /// task or is an admin.
    pub fn soft_delete(&mut self, actor: &Actor, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.delete_at(actor, clock.utc())
    }

    /// Marks the task deleted at `at`, touching only the deletion flag and
    /// the change timestamp.
    ///
    /// # Errors
    ///
    /// See [`Task::authorize_delete`].
    pub fn delete_at(&mut self, actor: &Actor, at: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.authorize_delete(actor)?;
        self.is_deleted = true;
        self.updated_at = at;
        self.revision += 1;
        Ok(())
    }

    /// Checks that `actor` may delete the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Unauthorized`] unless the actor created the
    /// task or is an admin.
    pub fn authorize_delete(&self, actor: &Actor) -> Result<(), TaskDomainError> {
        if actor.role() != Role::Admin && actor.user_id() != &self.created_by {
            return Err(TaskDomainError::Unauthorized {
                task_id: self.id,
                role: actor.role(),
                action: TaskAction::Delete,
            });
        }
        Ok(())
    }

    /// Stamps the first deadline of a recurring task that has none.
    pub(crate) fn initialize_deadline(&mut self, deadline: DateTime<Utc>) {
        if self.schedule.stored_deadline().is_none() {
            self.schedule.set_next_deadline(deadline);
        }
    }

    fn ensure_accepts_transitions(&self, assignee: &UserId) -> Result<(), TaskDomainError> {
        if !self.is_active() {
            return Err(self.rejection(assignee, TransitionRejection::TaskInactive));
        }
        if !self.assignees.contains(assignee) {
            return Err(self.rejection(assignee, TransitionRejection::NotAnAssignee));
        }
        if self.status == TaskStatus::Completed {
            return Err(self.rejection(assignee, TransitionRejection::TaskCompleted));
        }
        Ok(())
    }

    fn rejection(&self, assignee: &UserId, reason: TransitionRejection) -> TaskDomainError {
        TaskDomainError::InvalidTransition {
            task_id: self.id,
            assignee: assignee.clone(),
            reason,
        }
    }
}
