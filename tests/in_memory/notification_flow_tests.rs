//! End-to-end notification delivery driven by the task change feed.

use chrono::{Duration, Utc};
use taskrota::{
    notification::{domain::NotificationKind, ports::NotificationRepository},
    task::{
        domain::{Decision, RecurrenceRule, Role, Task},
        services::{CreateTaskRequest, ScheduleRequest},
    },
};

use super::helpers::{actor, ops, start_engine, uid};

fn one_off(assignees: &[&str]) -> CreateTaskRequest {
    CreateTaskRequest::new(
        actor("manager", Role::Manager),
        "Deep clean fryer",
        ops(),
        ScheduleRequest::Fixed {
            due_at: Utc::now() + Duration::days(2),
        },
    )
    .with_assignees(assignees.iter().map(|id| uid(id)))
}

#[tokio::test(flavor = "multi_thread")]
async fn creation_reaches_admins_managers_and_assignees() -> eyre::Result<()> {
    let engine = start_engine();
    let task = engine.service.create_task(one_off(&["alex"])).await?;

    for user in ["admin", "manager", "alex"] {
        engine.wait_for_inbox(user, 1).await?;
    }
    let inbox = engine.notifications.list_for(&uid("alex")).await?;
    let Some(notification) = inbox.first() else {
        eyre::bail!("assignee inbox empty");
    };
    eyre::ensure!(notification.kind() == NotificationKind::TaskCreated);
    eyre::ensure!(notification.task_id() == task.id());
    eyre::ensure!(engine.notifications.list_for(&uid("sam")).await?.is_empty());

    engine.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn approval_flow_notifies_each_step() -> eyre::Result<()> {
    let engine = start_engine();
    let task = engine.service.create_task(one_off(&["alex"])).await?;
    engine.wait_for_inbox("manager", 1).await?;

    engine
        .service
        .request_completion(task.id(), &uid("alex"))
        .await?;
    engine.wait_for_inbox("manager", 2).await?;

    engine
        .service
        .decide(
            task.id(),
            &uid("alex"),
            Decision::Approve,
            &actor("manager", Role::Manager),
        )
        .await?;
    let (notifications, _) = engine.finish().await?;

    let kinds_for = |user: &'static str| {
        let inbox = std::sync::Arc::clone(&notifications);
        async move {
            let listed = inbox.list_for(&uid(user)).await?;
            Ok::<Vec<NotificationKind>, eyre::Report>(
                listed.iter().map(|notification| notification.kind()).collect(),
            )
        }
    };
    let manager = kinds_for("manager").await?;
    eyre::ensure!(manager.len() == 2);
    eyre::ensure!(manager.contains(&NotificationKind::TaskRequestDone));

    let assignee = kinds_for("alex").await?;
    eyre::ensure!(assignee.len() == 2);
    eyre::ensure!(assignee.contains(&NotificationKind::TaskApproved));
    eyre::ensure!(!assignee.contains(&NotificationKind::TaskRequestDone));

    // Admins hear about creation, the request and, as observers, the approval.
    let admin = kinds_for("admin").await?;
    eyre::ensure!(admin.len() == 3, "unexpected admin notifications: {admin:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn recurring_completion_does_not_notify_twice() -> eyre::Result<()> {
    let engine = start_engine();
    let task = engine
        .service
        .create_task(
            CreateTaskRequest::new(
                actor("manager", Role::Manager),
                "Check thermometers",
                ops(),
                ScheduleRequest::Recurrence {
                    rule: RecurrenceRule::monthly(15)?,
                    time_of_day: None,
                },
            )
            .with_assignees([uid("alex")]),
        )
        .await?;
    engine.wait_for_inbox("alex", 1).await?;

    engine
        .service
        .request_completion(task.id(), &uid("alex"))
        .await?;
    let reopened = engine
        .service
        .decide(
            task.id(),
            &uid("alex"),
            Decision::Approve,
            &actor("admin", Role::Admin),
        )
        .await?;
    eyre::ensure!(reopened.approvals().is_empty());

    let archives: Vec<Task> = engine
        .repository
        .all()?
        .into_iter()
        .filter(Task::is_archived)
        .collect();
    eyre::ensure!(archives.len() == 1);

    let (notifications, _) = engine.finish().await?;

    let kinds: Vec<NotificationKind> = notifications
        .list_for(&uid("alex"))
        .await?
        .iter()
        .map(|notification| notification.kind())
        .collect();
    eyre::ensure!(kinds.len() == 2, "unexpected notifications: {kinds:?}");
    eyre::ensure!(kinds.contains(&NotificationKind::TaskApproved));
    eyre::ensure!(kinds.contains(&NotificationKind::TaskCreated));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn push_reaches_registered_devices() -> eyre::Result<()> {
    let engine = start_engine();
    engine.service.create_task(one_off(&["alex", "sam"])).await?;
    let (notifications, push) = engine.finish().await?;
    eyre::ensure!(notifications.unread_count(&uid("sam")).await? == 1);

    let mut tokens: Vec<String> = push.sent()?.into_iter().map(|sent| sent.token).collect();
    tokens.sort();
    eyre::ensure!(tokens == ["tok-admin", "tok-alex", "tok-manager"]);
    Ok(())
}
