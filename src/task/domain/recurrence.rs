//! Recurrence rules for repeating tasks.

use super::{ParseValueError, TaskDomainError};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How often a recurring task comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// On selected weekdays.
    Weekly,
    /// On a fixed day of each month.
    Monthly,
    /// On a fixed day and month each year.
    Yearly,
}

impl Frequency {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(ParseValueError::new("frequency", value)),
        }
    }
}

/// Weekday index counted from Sunday (`0`) to Saturday (`6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdayIndex(u8);

impl WeekdayIndex {
    /// Creates a validated weekday index.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrence`] when `value > 6`.
    pub fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value > 6 {
            return Err(TaskDomainError::InvalidRecurrence(format!(
                "weekday index {value} is outside 0..=6"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the index of a calendar date's weekday.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    /// Returns the numeric index.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<Weekday> for WeekdayIndex {
    fn from(weekday: Weekday) -> Self {
        // num_days_from_sunday is always within 0..=6
        Self(u8::try_from(weekday.num_days_from_sunday()).unwrap_or(0))
    }
}

/// Calendar day and month of a yearly recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayOfYear {
    day: u32,
    month: u32,
}

impl DayOfYear {
    /// Creates a validated day and month.
    ///
    /// `29/02` is accepted and falls on 28 February in common years.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrence`] when the pair is not a
    /// real calendar date.
    pub fn new(day: u32, month: u32) -> Result<Self, TaskDomainError> {
        // 2000 is a leap year, so 29/02 validates.
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(TaskDomainError::InvalidRecurrence(format!(
                "{day:02}/{month:02} is not a calendar date"
            )));
        }
        Ok(Self { day, month })
    }

    /// Parses `DD/MM`, or the legacy `MM-DD` form.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrence`] when neither format
    /// matches or the date is invalid.
    pub fn parse(value: &str) -> Result<Self, TaskDomainError> {
        let trimmed = value.trim();
        let invalid = || TaskDomainError::InvalidRecurrence(format!("unparseable date '{value}'"));
        let (day_part, month_part) = if let Some(parts) = trimmed.split_once('/') {
            parts
        } else if let Some((month_part, day_part)) = trimmed.split_once('-') {
            (day_part, month_part)
        } else {
            return Err(invalid());
        };
        let day = day_part.trim().parse::<u32>().map_err(|_| invalid())?;
        let month = month_part.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(day, month)
    }

    /// Returns the day of month.
    #[must_use]
    pub const fn day(self) -> u32 {
        self.day
    }

    /// Returns the month (1-based).
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for DayOfYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.day, self.month)
    }
}

/// Recurrence pattern of a repeating task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceRecord", into = "RecurrenceRecord")]
pub enum RecurrenceRule {
    /// Due on each of the listed weekdays.
    Weekly {
        /// Non-empty set of weekdays.
        days: BTreeSet<WeekdayIndex>,
    },
    /// Due on the same day of every month.
    Monthly {
        /// Day of month in `1..=31`.
        day_of_month: u32,
    },
    /// Due on the same date every year.
    Yearly {
        /// Day and month.
        date: DayOfYear,
    },
}

impl RecurrenceRule {
    /// Creates a weekly rule from Sunday-based weekday indices.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrence`] when no day is given or
    /// an index is out of range.
    pub fn weekly(weekdays: impl IntoIterator<Item = u8>) -> Result<Self, TaskDomainError> {
        let days = weekdays
            .into_iter()
            .map(WeekdayIndex::new)
            .collect::<Result<BTreeSet<_>, _>>()?;
        if days.is_empty() {
            return Err(TaskDomainError::InvalidRecurrence(
                "weekly recurrence needs at least one weekday".to_owned(),
            ));
        }
        Ok(Self::Weekly { days })
    }

    /// Creates a monthly rule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrence`] when the day is outside
    /// `1..=31`.
    pub fn monthly(day_of_month: u32) -> Result<Self, TaskDomainError> {
        if !(1..=31).contains(&day_of_month) {
            return Err(TaskDomainError::InvalidRecurrence(format!(
                "day of month {day_of_month} is outside 1..=31"
            )));
        }
        Ok(Self::Monthly { day_of_month })
    }

    /// Creates a yearly rule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrence`] when the date is invalid.
    pub fn yearly(day: u32, month: u32) -> Result<Self, TaskDomainError> {
        Ok(Self::Yearly {
            date: DayOfYear::new(day, month)?,
        })
    }

    /// Returns the rule's frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        match self {
            Self::Weekly { .. } => Frequency::Weekly,
            Self::Monthly { .. } => Frequency::Monthly,
            Self::Yearly { .. } => Frequency::Yearly,
        }
    }
}

/// Stored document shape of a recurrence rule.
///
/// Exactly one of the optional fields is populated, matching `frequency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRecord {
    /// Recurrence frequency.
    pub frequency: Frequency,
    /// Weekday indices for weekly rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    /// Day of month for monthly rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// `DD/MM` (or legacy `MM-DD`) for yearly rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_date: Option<String>,
}

impl TryFrom<RecurrenceRecord> for RecurrenceRule {
    type Error = TaskDomainError;

    fn try_from(record: RecurrenceRecord) -> Result<Self, Self::Error> {
        let RecurrenceRecord {
            frequency,
            days_of_week,
            day_of_month,
            specific_date,
        } = record;
        match (frequency, days_of_week, day_of_month, specific_date) {
            (Frequency::Weekly, Some(days), None, None) => Self::weekly(days),
            (Frequency::Monthly, None, Some(day), None) => Self::monthly(day),
            (Frequency::Yearly, None, None, Some(date)) => Ok(Self::Yearly {
                date: DayOfYear::parse(&date)?,
            }),
            (other, ..) => Err(TaskDomainError::InvalidRecurrence(format!(
                "{} recurrence must populate exactly its own field",
                other.as_str()
            ))),
        }
    }
}

impl From<RecurrenceRule> for RecurrenceRecord {
    fn from(rule: RecurrenceRule) -> Self {
        let frequency = rule.frequency();
        let mut record = Self {
            frequency,
            days_of_week: None,
            day_of_month: None,
            specific_date: None,
        };
        match rule {
            RecurrenceRule::Weekly { days } => {
                record.days_of_week = Some(days.into_iter().map(WeekdayIndex::value).collect());
            }
            RecurrenceRule::Monthly { day_of_month } => record.day_of_month = Some(day_of_month),
            RecurrenceRule::Yearly { date } => record.specific_date = Some(date.to_string()),
        }
        record
    }
}
