//! Lifecycle notifications.
//!
//! Committed task writes are diffed into lifecycle events, each event is
//! resolved to a set of users through the directory, and every recipient
//! gets an in-app record plus a push to each registered device. Delivery
//! problems are logged and reported; they never affect the task that
//! triggered them.
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
mod tests;
