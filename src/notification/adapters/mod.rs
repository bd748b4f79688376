//! Adapter implementations of notification ports.

pub mod memory;
