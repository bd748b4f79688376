//! Shared fixtures for task and notification unit tests.

use crate::task::domain::{
    Actor, DepartmentId, Priority, RecurrenceRule, Role, TaskDraft, TaskSchedule, UserId,
};
use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock pinned to an instant that tests move explicitly.
#[derive(Debug, Clone)]
pub(crate) struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub(crate) fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = now;
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub(crate) fn org_offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).expect("valid offset")
}

/// Returns the UTC instant of a wall-clock time in the organization's offset.
pub(crate) fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    org_offset()
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

pub(crate) fn uid(value: &str) -> UserId {
    UserId::new(value).expect("valid user id")
}

pub(crate) fn department(value: &str) -> DepartmentId {
    DepartmentId::new(value).expect("valid department id")
}

pub(crate) fn actor(id: &str, role: Role) -> Actor {
    Actor::new(uid(id), role)
}

pub(crate) fn draft(schedule: TaskSchedule, assignees: &[&str]) -> TaskDraft {
    TaskDraft {
        title: "Inventory check".to_owned(),
        content: String::new(),
        schedule,
        priority: Priority::Normal,
        alert_flag: false,
        assignees: assignees.iter().map(|id| uid(id)).collect(),
        supervisor_id: None,
        department_id: department("ops"),
        created_by: uid("creator"),
        is_recurring_template: false,
        parent_task_id: None,
    }
}

pub(crate) fn fixed_schedule(due_at: DateTime<Utc>) -> TaskSchedule {
    TaskSchedule::Fixed { due_at }
}

pub(crate) fn weekly_schedule(days: &[u8], next_deadline: Option<DateTime<Utc>>) -> TaskSchedule {
    TaskSchedule::Recurrence {
        rule: RecurrenceRule::weekly(days.iter().copied()).expect("valid weekly rule"),
        next_deadline,
    }
}
