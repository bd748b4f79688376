//! Unit tests for the task lifecycle module.

pub(crate) mod support;
