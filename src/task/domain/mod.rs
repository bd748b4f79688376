//! Domain model for task lifecycle management.
//!
//! The task domain models per-assignee approvals, aggregate completion,
//! recurrence rules and their deadline arithmetic while keeping all
//! infrastructure concerns outside of the domain boundary.

mod approval;
mod attention;
mod deadline;
mod error;
mod ids;
mod recurrence;
mod role;
mod schedule;
mod task;

pub use approval::{Approval, ApprovalChange, ApprovalState, ApprovalUpdate, Approvals};
pub use attention::{AttentionBucket, classify};
pub use deadline::{
    ComputedDeadline, DeadlineStrategy, EffectiveDeadline, OccurrenceMode, StoredDeadline,
    effective_deadline, end_of_day, local_time_of, next_occurrence, next_occurrence_at,
    next_occurrence_date,
};
pub use error::{ParseValueError, TaskAction, TaskDomainError, TransitionRejection};
pub use ids::{DepartmentId, TaskId, UserId};
pub use recurrence::{DayOfYear, Frequency, RecurrenceRecord, RecurrenceRule, WeekdayIndex};
pub use role::{Actor, Decision, Role};
pub use schedule::{TaskSchedule, TimeType};
pub use task::{Priority, RotationPlan, Task, TaskDraft, TaskStatus};
