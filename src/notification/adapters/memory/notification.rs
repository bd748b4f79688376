//! In-memory notification inbox.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::notification::{
    domain::{Notification, NotificationId},
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};
use crate::task::domain::UserId;

/// Thread-safe in-memory notification repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<HashMap<NotificationId, Notification>>>,
}

impl InMemoryNotificationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> NotificationRepositoryResult<RwLockReadGuard<'_, HashMap<NotificationId, Notification>>>
    {
        self.notifications.read().map_err(|err| {
            NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> NotificationRepositoryResult<RwLockWriteGuard<'_, HashMap<NotificationId, Notification>>>
    {
        self.notifications.write().map_err(|err| {
            NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        let mut notifications = self.write()?;
        if notifications.contains_key(&notification.id()) {
            return Err(NotificationRepositoryError::Duplicate(notification.id()));
        }
        notifications.insert(notification.id(), notification.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<Notification> {
        let mut notifications = self.write()?;
        let notification = notifications
            .get_mut(&id)
            .ok_or(NotificationRepositoryError::NotFound(id))?;
        notification.mark_read();
        Ok(notification.clone())
    }

    async fn list_for(&self, user_id: &UserId) -> NotificationRepositoryResult<Vec<Notification>> {
        let notifications = self.read()?;
        let mut owned: Vec<Notification> = notifications
            .values()
            .filter(|notification| notification.user_id() == user_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.id().cmp(&left.id()))
        });
        Ok(owned)
    }

    async fn unread_count(&self, user_id: &UserId) -> NotificationRepositoryResult<usize> {
        let notifications = self.read()?;
        Ok(notifications
            .values()
            .filter(|notification| notification.user_id() == user_id && !notification.is_read())
            .count())
    }
}
