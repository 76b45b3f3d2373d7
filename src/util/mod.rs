//! Utility modules for hwfacts.

mod ci;
mod container;

pub use ci::{CiInfo, detect_ci};
pub use container::{ContainerRuntime, detect_container};
