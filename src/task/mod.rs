//! Task lifecycle management.
//!
//! Tasks carry one approval per assignee and complete only when every
//! assignee is approved. Recurring tasks rotate on completion: the finished
//! instance is archived and the live task reopens with its next deadline.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;
