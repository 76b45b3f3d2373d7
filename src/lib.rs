//! hwfacts - multi-source host hardware fact collection.
//!
//! Each category of facts is answered by several interchangeable providers
//! (procfs, sysfs, external commands, runtime queries). They run in parallel,
//! isolated from each other, and their answers are reconciled into a single
//! record per category with provenance and conflicts kept.
//!
//! - [`collector`]: providers, registry, concurrent collection, reconciliation
//! - [`model`]: categories, raw results, records, snapshot
//! - [`report`]: JSON and text artifacts, persistence, CI step outputs
//! - [`config`]: defaults, config file, CLI overrides

pub mod collector;
pub mod config;
pub mod error;
pub mod fmt;
pub mod model;
pub mod report;
pub mod util;

pub use error::{Error, Result};
