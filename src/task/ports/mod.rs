//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod changes;
pub mod repository;

pub use changes::{TaskChange, TaskChangeReceiver, TaskChangeSender, change_feed};
pub use repository::{RotationOutcome, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
