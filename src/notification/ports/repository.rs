//! Repository port for the in-app notification inbox.

use crate::notification::domain::{Notification, NotificationId};
use crate::task::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification repository operations.
pub type NotificationRepositoryResult<T> = Result<T, NotificationRepositoryError>;

/// Notification persistence contract.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores a new notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::Duplicate`] when the identifier
    /// already exists.
    async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()>;

    /// Finds a notification by identifier.
    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>>;

    /// Marks a notification read and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::NotFound`] for unknown
    /// identifiers.
    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<Notification>;

    /// Lists a user's notifications, newest first.
    async fn list_for(&self, user_id: &UserId) -> NotificationRepositoryResult<Vec<Notification>>;

    /// Counts a user's unread notifications.
    async fn unread_count(&self, user_id: &UserId) -> NotificationRepositoryResult<usize>;
}

/// Errors returned by notification repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationRepositoryError {
    /// A notification with the same identifier already exists.
    #[error("duplicate notification identifier: {0}")]
    Duplicate(NotificationId),

    /// The notification was not found.
    #[error("notification not found: {0}")]
    NotFound(NotificationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
