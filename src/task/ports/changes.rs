//! Change notifications emitted by task stores.

use crate::task::domain::Task;
use tokio::sync::mpsc;

/// A committed write to the task collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// A task document was created.
    Created(Task),
    /// A task document was updated.
    Updated {
        /// Snapshot before the write.
        before: Box<Task>,
        /// Snapshot after the write.
        after: Box<Task>,
    },
}

impl TaskChange {
    /// Returns the most recent snapshot carried by the change.
    #[must_use]
    pub fn task(&self) -> &Task {
        match self {
            Self::Created(task) => task,
            Self::Updated { after, .. } => after,
        }
    }
}

/// Sending half of a task change feed.
pub type TaskChangeSender = mpsc::UnboundedSender<TaskChange>;

/// Receiving half of a task change feed.
pub type TaskChangeReceiver = mpsc::UnboundedReceiver<TaskChange>;

/// Creates a connected change feed.
#[must_use]
pub fn change_feed() -> (TaskChangeSender, TaskChangeReceiver) {
    mpsc::unbounded_channel()
}
