//! Shared fixtures and doubles for notification tests.

use crate::config::LifecycleConfig;
use crate::notification::{
    adapters::memory::{InMemoryDirectory, InMemoryNotificationRepository, RecordingPushGateway},
    domain::{Notification, NotificationId, UserProfile},
    ports::{
        DirectoryResult, DirectoryService, MulticastReport, NotificationRepository,
        NotificationRepositoryResult, PushError, PushGateway, PushMessage,
    },
    services::{LifecycleEventTrigger, NotificationDispatcher, RecipientResolver},
};
use crate::task::domain::{DepartmentId, Role, Task, UserId};
use crate::task::tests::support::{FixedClock, department, draft, fixed_schedule, local, uid};
use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Directory {}

    #[async_trait]
    impl DirectoryService for Directory {
        async fn list_users_by_role(&self, role: Role) -> DirectoryResult<Vec<UserProfile>>;
        async fn list_users_by_department_and_role(
            &self,
            department: &DepartmentId,
            role: Role,
        ) -> DirectoryResult<Vec<UserProfile>>;
        async fn get_user(&self, id: &UserId) -> DirectoryResult<Option<UserProfile>>;
    }
}

mock! {
    pub Push {}

    #[async_trait]
    impl PushGateway for Push {
        async fn send_multicast(
            &self,
            tokens: &[String],
            message: &PushMessage,
        ) -> Result<MulticastReport, PushError>;
    }
}

mock! {
    pub Notifications {}

    #[async_trait]
    impl NotificationRepository for Notifications {
        async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()>;
        async fn find_by_id(
            &self,
            id: NotificationId,
        ) -> NotificationRepositoryResult<Option<Notification>>;
        async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<Notification>;
        async fn list_for(&self, user_id: &UserId) -> NotificationRepositoryResult<Vec<Notification>>;
        async fn unread_count(&self, user_id: &UserId) -> NotificationRepositoryResult<usize>;
    }
}

pub(crate) type MemoryTrigger = LifecycleEventTrigger<
    InMemoryNotificationRepository,
    RecordingPushGateway,
    InMemoryDirectory,
    FixedClock,
>;

/// In-memory notification stack over a small organization.
///
/// | user | role     | department | tokens              |
/// |------|----------|------------|---------------------|
/// | a1   | admin    | -          | tok-a1              |
/// | a2   | admin    | -          | -                   |
/// | m1   | manager  | ops        | tok-m1              |
/// | m2   | manager  | kitchen    | tok-m2              |
/// | u1   | staff    | ops        | tok-u1a, tok-u1b    |
/// | u2   | staff    | ops        | -                   |
pub(crate) struct Stack {
    pub(crate) clock: FixedClock,
    pub(crate) directory: Arc<InMemoryDirectory>,
    pub(crate) notifications: Arc<InMemoryNotificationRepository>,
    pub(crate) push: Arc<RecordingPushGateway>,
}

impl Stack {
    pub(crate) fn new() -> Self {
        let directory = InMemoryDirectory::new();
        let users = [
            UserProfile::new(uid("a1"), "Avery Admin", Role::Admin)
                .with_push_tokens(["tok-a1".to_owned()]),
            UserProfile::new(uid("a2"), "Blair Admin", Role::Admin),
            UserProfile::new(uid("m1"), "Morgan Ops", Role::Manager)
                .with_department(department("ops"))
                .with_push_tokens(["tok-m1".to_owned()]),
            UserProfile::new(uid("m2"), "Casey Kitchen", Role::Manager)
                .with_department(department("kitchen"))
                .with_push_tokens(["tok-m2".to_owned()]),
            UserProfile::new(uid("u1"), "Jordan Staff", Role::Staff)
                .with_department(department("ops"))
                .with_push_tokens(["tok-u1a".to_owned(), "tok-u1b".to_owned()]),
            UserProfile::new(uid("u2"), "  ", Role::Staff).with_department(department("ops")),
        ];
        for user in users {
            directory.insert(user).expect("directory insert");
        }
        Self {
            clock: FixedClock::at(local(2024, 1, 8, 9, 0)),
            directory: Arc::new(directory),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            push: Arc::new(RecordingPushGateway::new()),
        }
    }

    pub(crate) fn dispatcher(
        &self,
    ) -> NotificationDispatcher<
        InMemoryNotificationRepository,
        RecordingPushGateway,
        InMemoryDirectory,
        FixedClock,
    > {
        NotificationDispatcher::new(
            Arc::clone(&self.notifications),
            Arc::clone(&self.push),
            Arc::clone(&self.directory),
            Arc::new(self.clock.clone()),
        )
    }

    pub(crate) fn resolver(&self) -> RecipientResolver<InMemoryDirectory> {
        RecipientResolver::new(Arc::clone(&self.directory))
    }

    pub(crate) fn trigger(&self) -> MemoryTrigger {
        let config = LifecycleConfig::default()
            .with_utc_offset_seconds(7 * 3600)
            .expect("valid offset");
        LifecycleEventTrigger::new(self.resolver(), self.dispatcher()).with_config(config)
    }

    pub(crate) async fn inbox(&self, user: &str) -> Vec<Notification> {
        self.notifications
            .list_for(&uid(user))
            .await
            .expect("list notifications")
    }

    pub(crate) fn pushed_tokens(&self) -> Vec<String> {
        self.push
            .sent()
            .expect("recorded pushes")
            .into_iter()
            .map(|sent| sent.token)
            .collect()
    }
}

/// Open one-off task in the ops department, due Wednesday 17:00 local.
pub(crate) fn ops_task(clock: &FixedClock, assignees: &[&str]) -> Task {
    Task::new(draft(fixed_schedule(local(2024, 1, 10, 17, 0)), assignees), clock)
        .expect("valid task")
}

pub(crate) fn users(ids: &[&str]) -> std::collections::BTreeSet<UserId> {
    ids.iter().map(|id| uid(id)).collect()
}
