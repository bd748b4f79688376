//! Dashboard grouping of tasks by urgency.

use super::{Priority, Task, TaskStatus, effective_deadline, end_of_day};
use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, TimeZone, Utc};

/// Urgency group a task falls into at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttentionBucket {
    /// Overdue, alert-flagged, or high priority and due soon.
    NeedsAttention,
    /// Due before the end of the current local week.
    ThisWeek,
    /// Due later, or already completed.
    Later,
    /// No deadline can be determined.
    Unscheduled,
}

/// Classifies `task` as of `now`.
///
/// Only open tasks need attention. High priority tasks need attention when
/// they come due within `attention_window`. Weeks end on Sunday.
#[must_use]
pub fn classify(
    task: &Task,
    now: DateTime<Utc>,
    offset: FixedOffset,
    attention_window: Duration,
) -> AttentionBucket {
    let Some(deadline) = effective_deadline(task, now, offset) else {
        return AttentionBucket::Unscheduled;
    };

    let upcoming = deadline >= now;
    let overdue = !upcoming;
    let due_soon = upcoming && deadline <= now + attention_window;
    let urgent = task.priority() == Priority::High && due_soon;

    if task.status() == TaskStatus::Open && (overdue || task.alert_flag() || urgent) {
        return AttentionBucket::NeedsAttention;
    }
    match end_of_week(now, offset) {
        Some(week_end) if upcoming && deadline <= week_end => AttentionBucket::ThisWeek,
        _ => AttentionBucket::Later,
    }
}

fn end_of_week(now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let today = now.with_timezone(&offset).date_naive();
    let from_sunday = today.weekday().num_days_from_sunday();
    let remaining = if from_sunday == 0 { 0 } else { 7 - from_sunday };
    let sunday = today.checked_add_days(Days::new(u64::from(remaining)))?;
    offset
        .from_local_datetime(&sunday.and_time(end_of_day()))
        .single()
        .map(|instant| instant.with_timezone(&Utc))
}
