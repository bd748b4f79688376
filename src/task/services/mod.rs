//! Application services for task lifecycle orchestration.

mod lifecycle;
mod rotation;

pub use lifecycle::{
    CreateTaskRequest, ScheduleRequest, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService,
};
pub use rotation::{RecurrenceRotationEngine, RotationError};
