//! Given steps for task approval BDD scenarios.

use super::world::{TaskApprovalWorld, run_async, user};
use chrono::{Duration, NaiveTime, Utc};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskrota::task::{
    domain::{Actor, DepartmentId, RecurrenceRule, Role, UserId},
    services::{CreateTaskRequest, ScheduleRequest},
};

fn create(
    world: &mut TaskApprovalWorld,
    schedule: ScheduleRequest,
    assignees: Vec<UserId>,
) -> Result<(), eyre::Report> {
    let department = DepartmentId::new("ops")
        .map_err(|err| eyre::eyre!("invalid department in scenario: {err}"))?;
    let request = CreateTaskRequest::new(
        Actor::new(user("morgan")?, Role::Manager),
        "Inventory check",
        department,
        schedule,
    )
    .with_assignees(assignees);
    let created = run_async(world.service.create_task(request))
        .wrap_err("create task for approval scenario")?;
    world.task = Some(created);
    Ok(())
}

fn tomorrow() -> ScheduleRequest {
    ScheduleRequest::Fixed {
        due_at: Utc::now() + Duration::days(1),
    }
}

#[given(r#"a one-off task assigned to "{assignee}""#)]
fn one_off_task(world: &mut TaskApprovalWorld, assignee: String) -> Result<(), eyre::Report> {
    create(world, tomorrow(), vec![user(&assignee)?])
}

#[given(r#"a one-off task shared by "{first}" and "{second}""#)]
fn shared_one_off_task(
    world: &mut TaskApprovalWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    create(world, tomorrow(), vec![user(&first)?, user(&second)?])
}

#[given(r#"a daily task assigned to "{assignee}""#)]
fn daily_task(world: &mut TaskApprovalWorld, assignee: String) -> Result<(), eyre::Report> {
    let rule = RecurrenceRule::weekly(0..=6)
        .map_err(|err| eyre::eyre!("invalid recurrence in scenario: {err}"))?;
    let schedule = ScheduleRequest::Recurrence {
        rule,
        time_of_day: NaiveTime::from_hms_opt(18, 0, 0),
    };
    create(world, schedule, vec![user(&assignee)?])
}
