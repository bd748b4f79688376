//! Periodic due-soon reminders.

use super::trigger::{EventOutcome, LifecycleEventTrigger};
use crate::config::{ConfigError, LifecycleConfig};
use crate::notification::{
    domain::LifecycleEvent,
    ports::{DirectoryService, NotificationRepository, PushGateway},
};
use crate::task::ports::{TaskRepository, TaskRepositoryResult};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs a job on a fixed period until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalScheduler {
    period: Duration,
}

impl IntervalScheduler {
    /// Creates a scheduler firing every `period`, starting immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDuration`] for a zero period.
    pub fn new(period: Duration) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::ZeroDuration("scheduler period"));
        }
        Ok(Self { period })
    }

    /// Returns the period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Spawns `job()` on every tick until `cancel` fires, then waits for
    /// runs still in flight.
    ///
    /// Runs may overlap when one outlasts the period.
    pub async fn run<F, Fut>(&self, cancel: CancellationToken, mut job: F)
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    in_flight.retain(|handle| !handle.is_finished());
                    in_flight.push(tokio::spawn(job()));
                }
            }
        }
        for handle in in_flight {
            if let Err(err) = handle.await {
                error!(error = %err, "scheduled run panicked");
            }
        }
    }
}

/// Reminds assignees of open tasks that are about to fall due.
pub struct DueSoonScan<R, N, P, D, C>
where
    R: TaskRepository,
    N: NotificationRepository,
    P: PushGateway,
    D: DirectoryService,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    trigger: LifecycleEventTrigger<N, P, D, C>,
    clock: Arc<C>,
    config: LifecycleConfig,
}

impl<R, N, P, D, C> Clone for DueSoonScan<R, N, P, D, C>
where
    R: TaskRepository,
    N: NotificationRepository,
    P: PushGateway,
    D: DirectoryService,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            trigger: self.trigger.clone(),
            clock: Arc::clone(&self.clock),
            config: self.config,
        }
    }
}

impl<R, N, P, D, C> DueSoonScan<R, N, P, D, C>
where
    R: TaskRepository + 'static,
    N: NotificationRepository + 'static,
    P: PushGateway + 'static,
    D: DirectoryService + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scan with the default configuration.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        trigger: LifecycleEventTrigger<N, P, D, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            trigger,
            clock,
            config: LifecycleConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Fires a due-soon event for every open, active task whose effective
    /// deadline lies in `(now, now + window]`.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the query fails.
    pub async fn scan_once(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<EventOutcome>> {
        let until = now + self.config.due_soon_window();
        let due = self
            .repository
            .find_open_due_between(now, until, self.config.utc_offset())
            .await?;
        let mut outcomes = Vec::with_capacity(due.len());
        for task in &due {
            if let Some(outcome) = self.trigger.fire(task, &LifecycleEvent::DueSoon).await {
                outcomes.push(outcome);
            }
        }
        info!(task_count = due.len(), until = %until, "due-soon scan finished");
        Ok(outcomes)
    }

    /// Scans on the configured interval until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let scheduler = match IntervalScheduler::new(self.config.scan_interval()) {
            Ok(scheduler) => scheduler,
            Err(err) => {
                error!(error = %err, "due-soon scan not started");
                return;
            }
        };
        scheduler
            .run(cancel, || {
                let scan = self.clone();
                async move {
                    let now = scan.clock.utc();
                    if let Err(err) = scan.scan_once(now).await {
                        error!(error = %err, "due-soon scan failed");
                    }
                }
            })
            .await;
    }
}
