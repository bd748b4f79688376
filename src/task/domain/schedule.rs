//! Time model of a task.

use super::{RecurrenceRule, TaskDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminant of [`TaskSchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeType {
    /// Single due instant.
    Fixed,
    /// Start and end instants.
    Range,
    /// Repeating deadline.
    Recurrence,
}

/// When a task is due.
///
/// Each variant carries only the fields it governs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "time_type", rename_all = "snake_case")]
pub enum TaskSchedule {
    /// Due at a single instant.
    Fixed {
        /// Due instant.
        due_at: DateTime<Utc>,
    },
    /// Worked on between two instants; due at the end.
    Range {
        /// Range start.
        from: DateTime<Utc>,
        /// Range end.
        to: DateTime<Utc>,
    },
    /// Repeats according to a rule.
    Recurrence {
        /// Recurrence pattern.
        rule: RecurrenceRule,
        /// Currently active due instant.
        ///
        /// Records created before this field existed carry `None` and fall
        /// back to recomputation from `rule`.
        #[serde(default)]
        next_deadline: Option<DateTime<Utc>>,
    },
}

impl TaskSchedule {
    /// Creates a validated range schedule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRange`] when `from` is after `to`.
    pub fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, TaskDomainError> {
        let schedule = Self::Range { from, to };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Checks invariants the variant constructors cannot express.
    pub(crate) fn validate(&self) -> Result<(), TaskDomainError> {
        match self {
            Self::Range { from, to } if from > to => Err(TaskDomainError::InvalidRange {
                from: *from,
                to: *to,
            }),
            _ => Ok(()),
        }
    }

    /// Returns the schedule's discriminant.
    #[must_use]
    pub const fn time_type(&self) -> TimeType {
        match self {
            Self::Fixed { .. } => TimeType::Fixed,
            Self::Range { .. } => TimeType::Range,
            Self::Recurrence { .. } => TimeType::Recurrence,
        }
    }

    /// Returns the recurrence rule for recurring schedules.
    #[must_use]
    pub const fn recurrence_rule(&self) -> Option<&RecurrenceRule> {
        match self {
            Self::Recurrence { rule, .. } => Some(rule),
            Self::Fixed { .. } | Self::Range { .. } => None,
        }
    }

    /// Returns the persisted due instant, without recomputation.
    #[must_use]
    pub const fn stored_deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Fixed { due_at } => Some(*due_at),
            Self::Range { to, .. } => Some(*to),
            Self::Recurrence { next_deadline, .. } => *next_deadline,
        }
    }

    /// Replaces the active deadline of a recurring schedule.
    pub(crate) fn set_next_deadline(&mut self, deadline: DateTime<Utc>) {
        if let Self::Recurrence { next_deadline, .. } = self {
            *next_deadline = Some(deadline);
        }
    }
}
