//! Error types for task domain validation and state transitions.

use super::{ApprovalState, Role, TaskId, UserId};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Errors returned while constructing or transitioning domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task has no assignees.
    #[error("a task requires at least one assignee")]
    NoAssignees,

    /// A user identifier is blank.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// A department identifier is blank.
    #[error("department identifier must not be empty")]
    EmptyDepartmentId,

    /// The recurrence rule is malformed.
    #[error("invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    /// A date range ends before it starts.
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange {
        /// Range start.
        from: DateTime<Utc>,
        /// Range end.
        to: DateTime<Utc>,
    },

    /// The next deadline falls outside the representable calendar.
    #[error("next deadline for task {0} is out of range")]
    DeadlineOutOfRange(TaskId),

    /// A state-machine operation was attempted from a state that does not
    /// permit it.
    #[error("invalid transition for {assignee} on task {task_id}: {reason}")]
    InvalidTransition {
        /// Task the operation targeted.
        task_id: TaskId,
        /// Assignee whose approval the operation targeted.
        assignee: UserId,
        /// Why the transition was refused.
        reason: TransitionRejection,
    },

    /// The acting role may not perform the requested action.
    #[error("role {role} may not {action} task {task_id}")]
    Unauthorized {
        /// Task the action targeted.
        task_id: TaskId,
        /// Role of the actor.
        role: Role,
        /// Attempted action.
        action: TaskAction,
    },
}

/// Reason a per-assignee transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRejection {
    /// The user is not among the task's assignees.
    NotAnAssignee,
    /// A completion request is already awaiting a decision.
    AlreadyPending,
    /// The assignee has already been approved.
    AlreadyApproved,
    /// A decision requires a pending request.
    NotPending(ApprovalState),
    /// The task is completed and frozen.
    TaskCompleted,
    /// The task is archived, deleted, or a recurring template.
    TaskInactive,
    /// The stored approval changed since the caller read it.
    StateChanged {
        /// State the caller observed.
        expected: ApprovalState,
        /// State found at write time.
        found: ApprovalState,
    },
    /// The approval record was rewritten since the caller read it, although
    /// it holds the same state again.
    RecordReplaced,
    /// The task has not reached aggregate completion.
    NotCompleted,
    /// The task does not recur.
    NotRecurring,
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnAssignee => write!(f, "user is not an assignee"),
            Self::AlreadyPending => write!(f, "completion already requested"),
            Self::AlreadyApproved => write!(f, "assignee already approved"),
            Self::NotPending(state) => write!(f, "approval is {state}, expected pending"),
            Self::TaskCompleted => write!(f, "task is completed"),
            Self::TaskInactive => write!(f, "task is not active work"),
            Self::StateChanged { expected, found } => {
                write!(f, "approval changed from {expected} to {found}")
            }
            Self::RecordReplaced => write!(f, "approval record was replaced"),
            Self::NotCompleted => write!(f, "task is not completed"),
            Self::NotRecurring => write!(f, "task does not recur"),
        }
    }
}

/// Actions guarded by role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Assigning a new task.
    Create,
    /// Approving or rejecting a completion request.
    Decide,
    /// Soft-deleting a task.
    Delete,
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Create => "create",
            Self::Decide => "decide",
            Self::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Error returned while parsing stored enum values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseValueError {
    /// Name of the value being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
