//! When steps for task approval BDD scenarios.

use super::world::{TaskApprovalWorld, run_async, user};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskrota::task::domain::{Actor, Decision, Role};

fn decide(
    world: &mut TaskApprovalWorld,
    decider: &str,
    role: &str,
    decision: Decision,
    assignee: &str,
) -> Result<(), eyre::Report> {
    let decider_role =
        Role::try_from(role).map_err(|err| eyre::eyre!("invalid role in scenario: {err}"))?;
    let actor = Actor::new(user(decider)?, decider_role);
    let task_id = world.task()?.id();

    let result = run_async(
        world
            .service
            .decide(task_id, &user(assignee)?, decision, &actor),
    );
    if let Ok(ref updated) = result {
        world.task = Some(updated.clone());
    }
    world.last_decision = Some(result);
    Ok(())
}

#[when(r#""{assignee}" requests completion"#)]
fn request_completion(world: &mut TaskApprovalWorld, assignee: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let updated = run_async(world.service.request_completion(task_id, &user(&assignee)?))
        .wrap_err("request completion in scenario")?;
    world.task = Some(updated);
    Ok(())
}

#[when(r#""{decider}" with role "{role}" approves "{assignee}""#)]
fn approve(
    world: &mut TaskApprovalWorld,
    decider: String,
    role: String,
    assignee: String,
) -> Result<(), eyre::Report> {
    decide(world, &decider, &role, Decision::Approve, &assignee)
}

#[when(r#""{decider}" with role "{role}" rejects "{assignee}""#)]
fn reject(
    world: &mut TaskApprovalWorld,
    decider: String,
    role: String,
    assignee: String,
) -> Result<(), eyre::Report> {
    decide(world, &decider, &role, Decision::Reject, &assignee)
}
