//! Per-assignee approval records.

use super::{Decision, ParseValueError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Approval state of one assignee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// No completion request has been made.
    #[default]
    Unset,
    /// Completion requested, awaiting a decision.
    Pending,
    /// Completion accepted by a manager or admin.
    Approved,
    /// Completion sent back by a manager or admin.
    Rejected,
}

impl ApprovalState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl From<Decision> for ApprovalState {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approve => Self::Approved,
            Decision::Reject => Self::Rejected,
        }
    }
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ApprovalState {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unset" | "" => Ok(Self::Unset),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseValueError::new("approval state", value)),
        }
    }
}

/// Approval record for a single assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    assignee_id: UserId,
    state: ApprovalState,
    decided_by: Option<UserId>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    revision: u64,
}

impl Approval {
    /// Returns the assignee the record belongs to.
    #[must_use]
    pub const fn assignee_id(&self) -> &UserId {
        &self.assignee_id
    }

    /// Returns the approval state.
    #[must_use]
    pub const fn state(&self) -> ApprovalState {
        self.state
    }

    /// Returns the manager or admin who made the latest decision, if any.
    #[must_use]
    pub const fn decided_by(&self) -> Option<&UserId> {
        self.decided_by.as_ref()
    }

    /// Returns when the record last changed.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the task revision at which the record was written.
    ///
    /// Revisions only grow, so a record recreated after a rotation never
    /// carries the revision of the record it replaced.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

/// Field-level change to one assignee's approval.
///
/// `expected` and `observed_revision` describe the record the caller read;
/// stores apply the update only when the persisted record still matches
/// both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalUpdate {
    /// Assignee whose record changes.
    pub assignee_id: UserId,
    /// State observed before the change.
    pub expected: ApprovalState,
    /// Revision of the observed record; `None` when no record existed.
    pub observed_revision: Option<u64>,
    /// State to write.
    pub next: ApprovalState,
    /// Decider, for approve/reject updates.
    pub decided_by: Option<UserId>,
    /// Time of the change.
    pub at: DateTime<Utc>,
}

/// A single assignee whose approval differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalChange {
    /// Assignee whose state changed.
    pub assignee_id: UserId,
    /// State in the earlier snapshot.
    pub before: ApprovalState,
    /// State in the later snapshot.
    pub after: ApprovalState,
    /// Decider recorded in the later snapshot.
    pub decided_by: Option<UserId>,
}

/// Approval records of a task keyed by assignee.
///
/// Absent entries read as [`ApprovalState::Unset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Approval>", into = "Vec<Approval>")]
pub struct Approvals(BTreeMap<UserId, Approval>);

impl Approvals {
    /// Creates an empty approval collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state recorded for `assignee`.
    #[must_use]
    pub fn state_of(&self, assignee: &UserId) -> ApprovalState {
        self.0
            .get(assignee)
            .map_or(ApprovalState::Unset, Approval::state)
    }

    /// Returns the full record for `assignee`, if any.
    #[must_use]
    pub fn get(&self, assignee: &UserId) -> Option<&Approval> {
        self.0.get(assignee)
    }

    /// Iterates over stored records in assignee order.
    pub fn iter(&self) -> impl Iterator<Item = &Approval> {
        self.0.values()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when every assignee maps to [`ApprovalState::Approved`].
    #[must_use]
    pub fn all_approved(&self, assignees: &BTreeSet<UserId>) -> bool {
        !assignees.is_empty()
            && assignees
                .iter()
                .all(|assignee| self.state_of(assignee) == ApprovalState::Approved)
    }

    /// Returns the revision of `assignee`'s record, if one exists.
    #[must_use]
    pub fn revision_of(&self, assignee: &UserId) -> Option<u64> {
        self.0.get(assignee).map(Approval::revision)
    }

    /// Writes the record described by `update` at task revision `revision`.
    pub(crate) fn apply(&mut self, update: &ApprovalUpdate, revision: u64) {
        self.0.insert(
            update.assignee_id.clone(),
            Approval {
                assignee_id: update.assignee_id.clone(),
                state: update.next,
                decided_by: update.decided_by.clone(),
                updated_at: update.at,
                revision,
            },
        );
    }

    /// Removes every record.
    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    /// Lists assignees whose state differs between `self` and `later`.
    #[must_use]
    pub fn diff(&self, later: &Self) -> Vec<ApprovalChange> {
        let keys: BTreeSet<&UserId> = self.0.keys().chain(later.0.keys()).collect();
        keys.into_iter()
            .filter_map(|assignee| {
                let before = self.state_of(assignee);
                let after = later.state_of(assignee);
                (before != after).then(|| ApprovalChange {
                    assignee_id: assignee.clone(),
                    before,
                    after,
                    decided_by: later.get(assignee).and_then(|a| a.decided_by.clone()),
                })
            })
            .collect()
    }
}

impl From<Vec<Approval>> for Approvals {
    fn from(records: Vec<Approval>) -> Self {
        Self(
            records
                .into_iter()
                .map(|record| (record.assignee_id.clone(), record))
                .collect(),
        )
    }
}

impl From<Approvals> for Vec<Approval> {
    fn from(approvals: Approvals) -> Self {
        approvals.0.into_values().collect()
    }
}
