//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use taskrota::{
    notification::{
        adapters::memory::{InMemoryDirectory, InMemoryNotificationRepository, RecordingPushGateway},
        domain::UserProfile,
        ports::NotificationRepository,
        services::{LifecycleEventTrigger, NotificationDispatcher, RecipientResolver},
    },
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Actor, DepartmentId, Role, UserId},
        services::TaskLifecycleService,
    },
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Service type used across integration tests.
pub type TestService = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;

/// Builds a user identifier.
///
/// # Panics
///
/// Panics when `value` is blank.
pub fn uid(value: &str) -> UserId {
    UserId::new(value).expect("valid user id")
}

/// Builds an actor.
pub fn actor(id: &str, role: Role) -> Actor {
    Actor::new(uid(id), role)
}

/// The `ops` department.
///
/// # Panics
///
/// Never in practice; the literal is non-blank.
pub fn ops() -> DepartmentId {
    DepartmentId::new("ops").expect("valid department id")
}

/// Provides a fresh task service over an empty repository.
#[fixture]
pub fn service() -> TestService {
    TaskLifecycleService::new(
        Arc::new(InMemoryTaskRepository::new()),
        Arc::new(DefaultClock),
    )
}

/// Task service wired to a running notification trigger.
pub struct Engine {
    /// Store shared by the service and the change feed.
    pub repository: Arc<InMemoryTaskRepository>,
    /// Task lifecycle service.
    pub service: TestService,
    /// In-app inbox.
    pub notifications: Arc<InMemoryNotificationRepository>,
    /// Recorded pushes.
    pub push: Arc<RecordingPushGateway>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

impl Engine {
    /// Waits until `user` has at least `count` notifications.
    ///
    /// # Errors
    ///
    /// Returns an error when the inbox does not fill within five seconds.
    pub async fn wait_for_inbox(&self, user: &str, count: usize) -> eyre::Result<()> {
        let notifications = Arc::clone(&self.notifications);
        let user_id = uid(user);
        tokio::time::timeout(Duration::from_secs(5), async move {
            loop {
                let listed = notifications.list_for(&user_id).await?;
                if listed.len() >= count {
                    return Ok::<(), eyre::Report>(());
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await?
    }

    /// Closes the change feed and waits until every queued change has been
    /// delivered.
    ///
    /// # Errors
    ///
    /// Returns an error when the trigger task panicked or did not drain.
    pub async fn finish(
        self,
    ) -> eyre::Result<(Arc<InMemoryNotificationRepository>, Arc<RecordingPushGateway>)> {
        let Self {
            repository,
            service,
            notifications,
            push,
            worker,
            ..
        } = self;
        drop(service);
        drop(repository);
        tokio::time::timeout(Duration::from_secs(5), worker).await??;
        Ok((notifications, push))
    }

    /// Stops the trigger and waits for in-flight deliveries.
    ///
    /// # Errors
    ///
    /// Returns an error when the trigger task panicked or did not stop.
    pub async fn shutdown(self) -> eyre::Result<()> {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.worker).await??;
        Ok(())
    }
}

/// Starts an engine over a directory with one admin, one `ops` manager and
/// two `ops` staff members.
///
/// # Panics
///
/// Panics when the directory cannot be seeded.
pub fn start_engine() -> Engine {
    let directory = InMemoryDirectory::new();
    for profile in [
        UserProfile::new(uid("admin"), "Avery Admin", Role::Admin)
            .with_push_tokens(["tok-admin".to_owned()]),
        UserProfile::new(uid("manager"), "Morgan Ops", Role::Manager)
            .with_department(ops())
            .with_push_tokens(["tok-manager".to_owned()]),
        UserProfile::new(uid("alex"), "Alex Tran", Role::Staff)
            .with_department(ops())
            .with_push_tokens(["tok-alex".to_owned()]),
        UserProfile::new(uid("sam"), "Sam Le", Role::Staff).with_department(ops()),
    ] {
        directory.insert(profile).expect("seed directory");
    }

    let (store, changes) = InMemoryTaskRepository::with_change_feed();
    let repository = Arc::new(store);
    let clock = Arc::new(DefaultClock);
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let push = Arc::new(RecordingPushGateway::new());

    let trigger = LifecycleEventTrigger::new(
        RecipientResolver::new(Arc::new(directory.clone())),
        NotificationDispatcher::new(
            Arc::clone(&notifications),
            Arc::clone(&push),
            Arc::new(directory),
            Arc::clone(&clock),
        ),
    );
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(trigger.run(changes, cancel.clone()));

    Engine {
        service: TaskLifecycleService::new(Arc::clone(&repository), clock),
        repository,
        notifications,
        push,
        cancel,
        worker,
    }
}
