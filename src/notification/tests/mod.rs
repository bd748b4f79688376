//! Unit tests for notification fan-out.

mod support;
