//! Mock host implementations for testing.
//!
//! This module provides `MockFs`, `MockCommands` and pre-built `MockHost`
//! scenarios for testing providers without requiring actual Linux `/proc`
//! filesystem access or installed tools.

mod commands;
mod filesystem;
mod scenarios;

pub use commands::MockCommands;
pub use filesystem::MockFs;
pub use scenarios::MockHost;
