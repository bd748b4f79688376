//! Per-recipient persistence and push fan-out.

use crate::notification::{
    domain::{Notification, NotificationPayload, task_link},
    ports::{
        DirectoryError, DirectoryService, NotificationRepository, NotificationRepositoryError,
        PushError, PushGateway, PushMessage, TokenFailure,
    },
};
use crate::task::domain::{TaskId, UserId};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why delivery to one recipient was incomplete.
#[derive(Debug, Clone, Error)]
pub enum DeliveryFailure {
    /// The in-app record could not be stored; no push was attempted.
    #[error("notification not stored: {0}")]
    Persistence(NotificationRepositoryError),
    /// Push tokens could not be looked up.
    #[error("push tokens unavailable: {0}")]
    Directory(DirectoryError),
    /// The push request failed as a whole.
    #[error("push request failed: {0}")]
    Push(PushError),
    /// Some tokens were rejected.
    #[error("{} push tokens rejected", .0.len())]
    Tokens(Vec<TokenFailure>),
}

/// Incomplete delivery to one recipient.
#[derive(Debug, Clone, Error)]
#[error("delivery to {user_id} incomplete: {failure}")]
pub struct DeliveryPartialFailure {
    /// Affected recipient.
    pub user_id: UserId,
    /// What went wrong.
    pub failure: DeliveryFailure,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// In-app records written.
    pub stored: usize,
    /// Device tokens the push reached.
    pub pushed: usize,
    /// Recipients whose delivery was incomplete.
    pub failures: Vec<DeliveryPartialFailure>,
}

struct Delivery {
    stored: bool,
    pushed: usize,
    failure: Option<DeliveryFailure>,
}

impl Delivery {
    const fn stored(pushed: usize) -> Self {
        Self {
            stored: true,
            pushed,
            failure: None,
        }
    }

    const fn failed(stored: bool, pushed: usize, failure: DeliveryFailure) -> Self {
        Self {
            stored,
            pushed,
            failure: Some(failure),
        }
    }
}

/// Stores in-app notifications and pushes them to every registered device.
pub struct NotificationDispatcher<N, P, D, C>
where
    N: NotificationRepository,
    P: PushGateway,
    D: DirectoryService,
    C: Clock + Send + Sync,
{
    notifications: Arc<N>,
    push: Arc<P>,
    directory: Arc<D>,
    clock: Arc<C>,
}

impl<N, P, D, C> Clone for NotificationDispatcher<N, P, D, C>
where
    N: NotificationRepository,
    P: PushGateway,
    D: DirectoryService,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            notifications: Arc::clone(&self.notifications),
            push: Arc::clone(&self.push),
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<N, P, D, C> NotificationDispatcher<N, P, D, C>
where
    N: NotificationRepository,
    P: PushGateway,
    D: DirectoryService,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(notifications: Arc<N>, push: Arc<P>, directory: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            notifications,
            push,
            directory,
            clock,
        }
    }

    /// Delivers `payload` about `task_id` to each of `recipients`.
    ///
    /// Each recipient is handled independently: a failure for one never
    /// prevents delivery to the others. Failed tokens are not retried.
    pub async fn dispatch(
        &self,
        recipients: &BTreeSet<UserId>,
        payload: &NotificationPayload,
        task_id: TaskId,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let message = PushMessage {
            title: payload.title.clone(),
            body: payload.body.clone(),
            link: task_link(task_id),
        };
        for recipient in recipients {
            let delivery = self.deliver(recipient, payload, &message, task_id).await;
            if delivery.stored {
                report.stored += 1;
            }
            report.pushed += delivery.pushed;
            if let Some(failure) = delivery.failure {
                report.failures.push(DeliveryPartialFailure {
                    user_id: recipient.clone(),
                    failure,
                });
            }
        }
        info!(
            task_id = %task_id,
            kind = %payload.kind,
            stored = report.stored,
            pushed = report.pushed,
            failure_count = report.failures.len(),
            "notification dispatched"
        );
        report
    }

    async fn deliver(
        &self,
        recipient: &UserId,
        payload: &NotificationPayload,
        message: &PushMessage,
        task_id: TaskId,
    ) -> Delivery {
        let notification = Notification::new(recipient.clone(), payload, task_id, &*self.clock);
        if let Err(err) = self.notifications.store(&notification).await {
            error!(uid = %recipient, task_id = %task_id, error = %err, "failed to store notification");
            return Delivery::failed(false, 0, DeliveryFailure::Persistence(err));
        }

        let tokens = match self.directory.get_user(recipient).await {
            Ok(Some(profile)) => profile.push_tokens,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(uid = %recipient, error = %err, "push token lookup failed");
                return Delivery::failed(true, 0, DeliveryFailure::Directory(err));
            }
        };
        if tokens.is_empty() {
            debug!(uid = %recipient, "no push tokens registered");
            return Delivery::stored(0);
        }

        match self.push.send_multicast(&tokens, message).await {
            Ok(multicast) if multicast.failures.is_empty() => {
                Delivery::stored(multicast.success_count)
            }
            Ok(multicast) => {
                warn!(
                    uid = %recipient,
                    success_count = multicast.success_count,
                    failure_count = multicast.failure_count(),
                    "push partially delivered"
                );
                Delivery::failed(
                    true,
                    multicast.success_count,
                    DeliveryFailure::Tokens(multicast.failures),
                )
            }
            Err(err) => {
                warn!(uid = %recipient, error = %err, "push request failed");
                Delivery::failed(true, 0, DeliveryFailure::Push(err))
            }
        }
    }
}
