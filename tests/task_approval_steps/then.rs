//! Then steps for task approval BDD scenarios.

use super::world::{TaskApprovalWorld, user};
use rstest_bdd_macros::then;
use taskrota::task::{
    domain::{ApprovalState, Task, TaskDomainError, TaskStatus},
    services::TaskLifecycleError,
};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskApprovalWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task()?;

    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then(r#"the approval of "{assignee}" is "{state}""#)]
fn approval_is(
    world: &TaskApprovalWorld,
    assignee: String,
    state: String,
) -> Result<(), eyre::Report> {
    let expected = ApprovalState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected approval in scenario: {err}"))?;
    let found = world.task()?.approval_state(&user(&assignee)?);

    if found != expected {
        return Err(eyre::eyre!("expected {assignee} to be {expected}, found {found}"));
    }
    Ok(())
}

#[then("the decision is refused as unauthorized")]
fn refused_as_unauthorized(world: &TaskApprovalWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_decision
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing decision result"))?;

    if !matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::Unauthorized { .. }))
    ) {
        return Err(eyre::eyre!("expected Unauthorized error, got {result:?}"));
    }
    Ok(())
}

#[then("the decision is refused as an invalid transition")]
fn refused_as_invalid_transition(world: &TaskApprovalWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_decision
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing decision result"))?;

    if !matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::InvalidTransition { .. }))
    ) {
        return Err(eyre::eyre!("expected InvalidTransition error, got {result:?}"));
    }
    Ok(())
}

#[then("one archived copy exists")]
fn one_archived_copy(world: &TaskApprovalWorld) -> Result<(), eyre::Report> {
    let original = world.task()?.id();
    let archives: Vec<Task> = world
        .repository
        .all()?
        .into_iter()
        .filter(|task| task.is_archived() && task.original_task_id() == Some(original))
        .collect();

    if archives.len() != 1 {
        return Err(eyre::eyre!("expected one archived copy, found {}", archives.len()));
    }
    Ok(())
}
