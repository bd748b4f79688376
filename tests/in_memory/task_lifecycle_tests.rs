//! In-memory integration tests for task lifecycle operations.

use chrono::NaiveTime;
use rstest::rstest;
use taskrota::task::{
    domain::{ApprovalState, Decision, Priority, RecurrenceRule, Role, Task, TaskStatus},
    services::{CreateTaskRequest, ScheduleRequest, TaskLifecycleError},
};

use super::helpers::{TestService, actor, ops, service, uid};

fn weekly_every_day(assignees: &[&str]) -> CreateTaskRequest {
    CreateTaskRequest::new(
        actor("manager", Role::Manager),
        "Close the till",
        ops(),
        ScheduleRequest::Recurrence {
            rule: RecurrenceRule::weekly(0..=6).expect("valid rule"),
            time_of_day: NaiveTime::from_hms_opt(21, 0, 0),
        },
    )
    .with_priority(Priority::High)
    .with_assignees(assignees.iter().map(|id| uid(id)))
}

async fn request_and_approve(
    service: &TestService,
    task: &Task,
    assignee: &str,
) -> Result<Task, TaskLifecycleError> {
    service.request_completion(task.id(), &uid(assignee)).await?;
    service
        .decide(
            task.id(),
            &uid(assignee),
            Decision::Approve,
            &actor("manager", Role::Manager),
        )
        .await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn daily_task_cycles_through_several_completions(service: TestService) -> eyre::Result<()> {
    let task = service.create_task(weekly_every_day(&["alex"])).await?;
    let first_deadline = task.schedule().stored_deadline();
    eyre::ensure!(first_deadline.is_some(), "recurring task has a deadline");

    let reopened = request_and_approve(&service, &task, "alex").await?;
    eyre::ensure!(reopened.status() == TaskStatus::Open);
    eyre::ensure!(reopened.schedule().stored_deadline() > first_deadline);
    eyre::ensure!(reopened.approvals().is_empty());
    eyre::ensure!(reopened.priority() == Priority::High);

    let Some(stored) = service.find_by_id(task.id()).await? else {
        eyre::bail!("live task missing after rotation");
    };
    eyre::ensure!(stored == reopened);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shared_task_waits_for_every_assignee(service: TestService) -> eyre::Result<()> {
    let task = service.create_task(weekly_every_day(&["alex", "sam"])).await?;

    let half = request_and_approve(&service, &task, "alex").await?;
    eyre::ensure!(half.status() == TaskStatus::Open);
    eyre::ensure!(half.approval_state(&uid("alex")) == ApprovalState::Approved);
    eyre::ensure!(half.approval_state(&uid("sam")) == ApprovalState::Unset);

    let rotated = request_and_approve(&service, &task, "sam").await?;
    eyre::ensure!(rotated.approvals().is_empty());
    eyre::ensure!(rotated.status() == TaskStatus::Open);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_request_can_be_resubmitted(service: TestService) -> eyre::Result<()> {
    let task = service
        .create_task(
            CreateTaskRequest::new(
                actor("alex", Role::Staff),
                "Restock napkins",
                ops(),
                ScheduleRequest::Fixed {
                    due_at: chrono::Utc::now() + chrono::Duration::days(1),
                },
            )
            .with_assignees([uid("alex")]),
        )
        .await?;

    service.request_completion(task.id(), &uid("alex")).await?;
    let rejected = service
        .decide(
            task.id(),
            &uid("alex"),
            Decision::Reject,
            &actor("admin", Role::Admin),
        )
        .await?;
    eyre::ensure!(rejected.approval_state(&uid("alex")) == ApprovalState::Rejected);

    let completed = request_and_approve(&service, &task, "alex").await?;
    eyre::ensure!(completed.status() == TaskStatus::Completed);
    eyre::ensure!(completed.completed_at().is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assigner_cannot_decide(service: TestService) -> eyre::Result<()> {
    let task = service.create_task(weekly_every_day(&["alex"])).await?;
    service.request_completion(task.id(), &uid("alex")).await?;

    let result = service
        .decide(
            task.id(),
            &uid("alex"),
            Decision::Approve,
            &actor("lead", Role::Assigner),
        )
        .await;

    eyre::ensure!(
        matches!(result, Err(TaskLifecycleError::Domain(_))),
        "expected a domain error, got {result:?}"
    );
    Ok(())
}
