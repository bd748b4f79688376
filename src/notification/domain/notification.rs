//! In-app notification records and push payloads.

use super::NotificationId;
use crate::task::domain::{TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned.
    TaskCreated,
    /// An assignee asked for completion approval.
    TaskRequestDone,
    /// A completion request was approved.
    TaskApproved,
    /// A completion request was rejected.
    TaskRejected,
    /// An open task is due within the scan window.
    TaskDueSoon,
}

impl NotificationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskRequestDone => "task_request_done",
            Self::TaskApproved => "task_approved",
            Self::TaskRejected => "task_rejected",
            Self::TaskDueSoon => "task_due_soon",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered content delivered to one group of recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Notification category.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Message text.
    pub body: String,
}

impl NotificationPayload {
    /// Creates a payload.
    #[must_use]
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Returns the in-app route opened when a push message is tapped.
#[must_use]
pub fn task_link(task_id: TaskId) -> String {
    format!("/app/tasks/{task_id}")
}

/// Persisted in-app notification for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    user_id: UserId,
    kind: NotificationKind,
    title: String,
    body: String,
    task_id: TaskId,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates an unread notification for `user_id`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        payload: &NotificationPayload,
        task_id: TaskId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind: payload.kind,
            title: payload.title.clone(),
            body: payload.body.clone(),
            task_id,
            is_read: false,
            created_at: clock.utc(),
        }
    }

    /// Returns the notification identifier.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the category.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Returns the headline.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the message text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the task the notification refers to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns `true` once the recipient has read the notification.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.is_read
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks the notification read.
    pub const fn mark_read(&mut self) {
        self.is_read = true;
    }
}
