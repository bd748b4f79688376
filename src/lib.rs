//! Taskrota: task lifecycle, recurrence and notification engine.
//!
//! This crate tracks multi-assignee tasks through a request/approve cycle,
//! rotates recurring tasks into their next occurrence once completed, and
//! fans lifecycle events out to in-app and push notifications.
//!
//! # Architecture
//!
//! Taskrota follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage, directory and push
//! - **Adapters**: In-memory implementations of the ports
//!
//! # Modules
//!
//! - [`config`]: Timezone offset and scan windows
//! - [`task`]: Approval state machine, deadlines and rotation
//! - [`notification`]: Recipient resolution, dispatch and triggers

pub mod config;
pub mod notification;
pub mod task;
