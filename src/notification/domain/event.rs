//! Lifecycle events that trigger notifications.

use super::NotificationKind;
use crate::task::domain::{ApprovalChange, ApprovalState, UserId};

/// A task lifecycle occurrence worth telling people about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The task was created.
    Created,
    /// `assignee` requested completion approval.
    CompletionRequested {
        /// Requesting assignee.
        assignee: UserId,
    },
    /// `assignee`'s request was approved.
    Approved {
        /// Approved assignee.
        assignee: UserId,
        /// Manager or admin who approved, when known.
        decider: Option<UserId>,
    },
    /// `assignee`'s request was rejected.
    Rejected {
        /// Rejected assignee.
        assignee: UserId,
    },
    /// The task is due within the scan window.
    DueSoon,
}

impl LifecycleEvent {
    /// Maps a per-assignee approval change to the event it fires.
    ///
    /// Resets to the unset state fire nothing.
    #[must_use]
    pub fn from_approval_change(change: &ApprovalChange) -> Option<Self> {
        let assignee = change.assignee_id.clone();
        match change.after {
            ApprovalState::Pending => Some(Self::CompletionRequested { assignee }),
            ApprovalState::Approved => Some(Self::Approved {
                assignee,
                decider: change.decided_by.clone(),
            }),
            ApprovalState::Rejected => Some(Self::Rejected { assignee }),
            ApprovalState::Unset => None,
        }
    }

    /// Returns the notification category for the event.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::Created => NotificationKind::TaskCreated,
            Self::CompletionRequested { .. } => NotificationKind::TaskRequestDone,
            Self::Approved { .. } => NotificationKind::TaskApproved,
            Self::Rejected { .. } => NotificationKind::TaskRejected,
            Self::DueSoon => NotificationKind::TaskDueSoon,
        }
    }

    /// Returns the assignee the event concerns, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<&UserId> {
        match self {
            Self::CompletionRequested { assignee }
            | Self::Approved { assignee, .. }
            | Self::Rejected { assignee } => Some(assignee),
            Self::Created | Self::DueSoon => None,
        }
    }
}
