//! Deadline calculation for recurring tasks.
//!
//! Calendar arithmetic is pure: callers supply the reference date (their
//! notion of "now") and, for the zoned helpers, the organization's UTC
//! offset.
//!
//! Two comparison modes exist because initial scheduling and rotation need
//! different answers on the due day itself:
//!
//! - [`OccurrenceMode::Inclusive`] accepts today, so a task created on a
//!   Monday with a Monday rule is due the same day.
//! - [`OccurrenceMode::Strict`] requires a date after today, so rotating a
//!   task completed on its due day always moves the deadline forward.
//!
//! Monthly rules whose day exceeds the target month's length clamp to the
//! last day of that month (31 → 28/29 February, 30 April, ...). Yearly
//! `29/02` clamps to 28 February in common years.

use super::{RecurrenceRule, Task, WeekdayIndex};
use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use std::collections::BTreeSet;

/// Comparison applied against the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceMode {
    /// The reference date itself qualifies.
    Inclusive,
    /// Only dates after the reference date qualify.
    Strict,
}

impl OccurrenceMode {
    const fn admits_weekday(self, candidate: u8, current: u8) -> bool {
        match self {
            Self::Inclusive => candidate >= current,
            Self::Strict => candidate > current,
        }
    }

    fn admits_date(self, candidate: NaiveDate, reference: NaiveDate) -> bool {
        match self {
            Self::Inclusive => candidate >= reference,
            Self::Strict => candidate > reference,
        }
    }
}

/// Time of day applied when none is supplied: `23:59:59.999`.
#[must_use]
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

/// Computes the next calendar date matching `rule`.
///
/// Returns `None` only when the result would leave chrono's supported
/// calendar range.
#[must_use]
pub fn next_occurrence_date(
    rule: &RecurrenceRule,
    reference: NaiveDate,
    mode: OccurrenceMode,
) -> Option<NaiveDate> {
    match rule {
        RecurrenceRule::Weekly { days } => next_weekly(days, reference, mode),
        RecurrenceRule::Monthly { day_of_month } => next_monthly(*day_of_month, reference, mode),
        RecurrenceRule::Yearly { date } => {
            let this_year = clamped_date(reference.year(), date.month(), date.day())?;
            if mode.admits_date(this_year, reference) {
                Some(this_year)
            } else {
                clamped_date(reference.year().checked_add(1)?, date.month(), date.day())
            }
        }
    }
}

/// Computes the next occurrence of `rule` as a local date and time.
///
/// `time_of_day` defaults to [`end_of_day`].
#[must_use]
pub fn next_occurrence(
    rule: &RecurrenceRule,
    reference: NaiveDate,
    time_of_day: Option<NaiveTime>,
    mode: OccurrenceMode,
) -> Option<NaiveDateTime> {
    let date = next_occurrence_date(rule, reference, mode)?;
    Some(date.and_time(time_of_day.unwrap_or_else(end_of_day)))
}

/// Computes the next occurrence of `rule` relative to an instant.
///
/// The reference instant and the result are interpreted in `offset`, so the
/// weekday and day-of-month comparisons match the organization's calendar.
#[must_use]
pub fn next_occurrence_at(
    rule: &RecurrenceRule,
    reference: DateTime<Utc>,
    time_of_day: Option<NaiveTime>,
    mode: OccurrenceMode,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let local_date = reference.with_timezone(&offset).date_naive();
    let local = next_occurrence(rule, local_date, time_of_day, mode)?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Returns the local time of day of `instant` in `offset`.
#[must_use]
pub fn local_time_of(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveTime {
    instant.with_timezone(&offset).time()
}

fn next_weekly(
    days: &BTreeSet<WeekdayIndex>,
    reference: NaiveDate,
    mode: OccurrenceMode,
) -> Option<NaiveDate> {
    let current = WeekdayIndex::of(reference).value();
    let offset = days
        .iter()
        .map(|day| day.value())
        .find(|day| mode.admits_weekday(*day, current))
        .map_or_else(
            || {
                let first = days.first().map_or(current, |day| day.value());
                7 - current + first
            },
            |day| day - current,
        );
    reference.checked_add_days(Days::new(u64::from(offset)))
}

fn next_monthly(day_of_month: u32, reference: NaiveDate, mode: OccurrenceMode) -> Option<NaiveDate> {
    let this_month = clamped_date(reference.year(), reference.month(), day_of_month)?;
    if mode.admits_date(this_month, reference) {
        return Some(this_month);
    }
    let (year, month) = following_month(reference.year(), reference.month())?;
    clamped_date(year, month, day_of_month)
}

fn following_month(year: i32, month: u32) -> Option<(i32, u32)> {
    if month >= 12 {
        Some((year.checked_add(1)?, 1))
    } else {
        Some((year, month + 1))
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = following_month(year, month)?;
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|last| last.day())
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

/// Resolves when a task is due.
pub trait DeadlineStrategy {
    /// Returns the task's due instant as seen at `now`, if the strategy can
    /// determine one.
    fn deadline_for(&self, task: &Task, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// Reads the persisted due instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredDeadline;

impl DeadlineStrategy for StoredDeadline {
    fn deadline_for(&self, task: &Task, _now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        task.schedule().stored_deadline()
    }
}

/// Recomputes a recurring task's deadline from its rule.
///
/// Used for legacy records that predate the stored `next_deadline`.
#[derive(Debug, Clone, Copy)]
pub struct ComputedDeadline {
    offset: FixedOffset,
}

impl ComputedDeadline {
    /// Creates a strategy evaluating calendars in `offset`.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl DeadlineStrategy for ComputedDeadline {
    fn deadline_for(&self, task: &Task, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let rule = task.schedule().recurrence_rule()?;
        next_occurrence_at(rule, now, None, OccurrenceMode::Inclusive, self.offset)
    }
}

/// Tries `primary`, then `fallback`.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveDeadline<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> EffectiveDeadline<P, F>
where
    P: DeadlineStrategy,
    F: DeadlineStrategy,
{
    /// Composes two strategies.
    #[must_use]
    pub const fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> DeadlineStrategy for EffectiveDeadline<P, F>
where
    P: DeadlineStrategy,
    F: DeadlineStrategy,
{
    fn deadline_for(&self, task: &Task, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.primary
            .deadline_for(task, now)
            .or_else(|| self.fallback.deadline_for(task, now))
    }
}

/// Returns the task's effective deadline: the stored one when present,
/// otherwise the recomputed recurrence deadline.
#[must_use]
pub fn effective_deadline(
    task: &Task,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    EffectiveDeadline::new(StoredDeadline, ComputedDeadline::new(offset)).deadline_for(task, now)
}
