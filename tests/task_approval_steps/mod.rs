//! Step definitions for task approval scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
