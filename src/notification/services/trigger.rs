//! Turns committed task writes into notifications.

use super::{
    dispatcher::{DispatchReport, NotificationDispatcher},
    resolver::{RecipientResolutionPartialFailure, RecipientResolver},
    templates::{Audience, TemplateContext, render_payload},
};
use crate::config::LifecycleConfig;
use crate::notification::{
    domain::{LifecycleEvent, NotificationKind},
    ports::{DirectoryService, NotificationRepository, PushGateway},
};
use crate::task::{domain::Task, ports::TaskChange, ports::TaskChangeReceiver};
use mockable::Clock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What happened when one event was fired.
#[derive(Debug, Clone)]
pub struct EventOutcome {
    /// Category of the fired event.
    pub kind: NotificationKind,
    /// Recipient groups that could not be resolved.
    pub resolution_failures: Vec<RecipientResolutionPartialFailure>,
    /// Delivery to primary recipients.
    pub delivery: DispatchReport,
    /// Delivery to observers.
    pub observer_delivery: DispatchReport,
}

/// Fires lifecycle notifications for created and updated tasks.
pub struct LifecycleEventTrigger<N, P, D, C>
where
    N: NotificationRepository,
    P: PushGateway,
    D: DirectoryService,
    C: Clock + Send + Sync,
{
    resolver: RecipientResolver<D>,
    dispatcher: NotificationDispatcher<N, P, D, C>,
    config: LifecycleConfig,
}

impl<N, P, D, C> Clone for LifecycleEventTrigger<N, P, D, C>
where
    N: NotificationRepository,
    P: PushGateway,
    D: DirectoryService,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            dispatcher: self.dispatcher.clone(),
            config: self.config,
        }
    }
}

impl<N, P, D, C> LifecycleEventTrigger<N, P, D, C>
where
    N: NotificationRepository + 'static,
    P: PushGateway + 'static,
    D: DirectoryService + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a trigger with the default configuration.
    #[must_use]
    pub fn new(
        resolver: RecipientResolver<D>,
        dispatcher: NotificationDispatcher<N, P, D, C>,
    ) -> Self {
        Self {
            resolver,
            dispatcher,
            config: LifecycleConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Notifies everyone concerned by a newly created task.
    pub async fn on_task_created(&self, task: &Task) -> Vec<EventOutcome> {
        self.fire(task, &LifecycleEvent::Created)
            .await
            .into_iter()
            .collect()
    }

    /// Fires one event per assignee whose approval changed between `before`
    /// and `after`.
    pub async fn on_task_updated(&self, before: &Task, after: &Task) -> Vec<EventOutcome> {
        let mut outcomes = Vec::new();
        for change in before.approvals().diff(after.approvals()) {
            let Some(event) = LifecycleEvent::from_approval_change(&change) else {
                continue;
            };
            if let Some(outcome) = self.fire(after, &event).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Dispatches a change from the task change feed.
    pub async fn handle(&self, change: &TaskChange) -> Vec<EventOutcome> {
        match change {
            TaskChange::Created(task) => self.on_task_created(task).await,
            TaskChange::Updated { before, after } => self.on_task_updated(before, after).await,
        }
    }

    /// Resolves, renders and dispatches `event` for `task`.
    ///
    /// Returns `None` when the task is not active work or rendering fails.
    pub async fn fire(&self, task: &Task, event: &LifecycleEvent) -> Option<EventOutcome> {
        let kind = event.kind();
        if !task.is_active() {
            debug!(task_id = %task.id(), %kind, "skipping event for inactive task");
            return None;
        }

        let resolution = self.resolver.resolve(task, event).await;
        if resolution.is_empty() {
            debug!(task_id = %task.id(), %kind, "event has no recipients");
        }

        let actor_name = match event {
            LifecycleEvent::CompletionRequested { assignee } => {
                Some(self.resolver.display_name(assignee).await)
            }
            _ => None,
        };
        let assignee_name = match event.assignee() {
            Some(assignee) if !resolution.observers.is_empty() => {
                Some(self.resolver.display_name(assignee).await)
            }
            _ => None,
        };
        let window_hours = self.config.due_soon_window().num_hours();
        let mut context = TemplateContext::new(task.title()).with_window_hours(window_hours);
        if let Some(name) = actor_name.as_deref() {
            context = context.with_actor_name(name);
        }
        if let Some(name) = assignee_name.as_deref() {
            context = context.with_assignee(name);
        }

        let payload = match render_payload(kind, Audience::Primary, context) {
            Ok(payload) => payload,
            Err(err) => {
                error!(task_id = %task.id(), %kind, error = %err, "failed to render notification");
                return None;
            }
        };
        let delivery = self
            .dispatcher
            .dispatch(&resolution.recipients, &payload, task.id())
            .await;

        let observer_delivery = if resolution.observers.is_empty() {
            DispatchReport::default()
        } else {
            match render_payload(kind, Audience::Observer, context) {
                Ok(observer_payload) => {
                    self.dispatcher
                        .dispatch(&resolution.observers, &observer_payload, task.id())
                        .await
                }
                Err(err) => {
                    error!(task_id = %task.id(), %kind, error = %err, "failed to render observer notification");
                    DispatchReport::default()
                }
            }
        };

        Some(EventOutcome {
            kind,
            resolution_failures: resolution.failures,
            delivery,
            observer_delivery,
        })
    }

    /// Consumes `changes` until the feed closes or `cancel` fires.
    ///
    /// Each change is handled on its own spawned task; in-flight handlers
    /// are awaited before returning.
    pub async fn run(self, mut changes: TaskChangeReceiver, cancel: CancellationToken) {
        info!("lifecycle event trigger started");
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                received = changes.recv() => {
                    let Some(change) = received else { break };
                    in_flight.retain(|handle| !handle.is_finished());
                    let trigger = self.clone();
                    in_flight.push(tokio::spawn(async move {
                        trigger.handle(&change).await;
                    }));
                }
            }
        }
        for handle in in_flight {
            if let Err(err) = handle.await {
                error!(error = %err, "event handler panicked");
            }
        }
        info!("lifecycle event trigger stopped");
    }
}
