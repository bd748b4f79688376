//! Shared world state for task approval BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskrota::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Task, UserId},
    services::{TaskLifecycleError, TaskLifecycleService},
};

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;

/// Scenario world for approval behaviour tests.
pub struct TaskApprovalWorld {
    /// Backing repository, shared with the service.
    pub repository: Arc<InMemoryTaskRepository>,
    /// Service under test.
    pub service: TestTaskService,
    /// Latest known state of the scenario's task.
    pub task: Option<Task>,
    /// Outcome of the most recent decision step.
    pub last_decision: Option<Result<Task, TaskLifecycleError>>,
}

impl TaskApprovalWorld {
    /// Creates a world over an empty repository.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let service = TaskLifecycleService::new(Arc::clone(&repository), Arc::new(DefaultClock));

        Self {
            repository,
            service,
            task: None,
            last_decision: None,
        }
    }

    /// Returns the scenario's task.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for TaskApprovalWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskApprovalWorld {
    TaskApprovalWorld::default()
}

/// Parses a user identifier from a step argument.
///
/// # Errors
///
/// Returns an error when the identifier is blank.
pub fn user(value: &str) -> Result<UserId, eyre::Report> {
    UserId::new(value).map_err(|err| eyre::eyre!("invalid user in scenario: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
