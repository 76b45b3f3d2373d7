//! Cgroup v2 memory accounting.
//!
//! Inside a container the host's `/proc/meminfo` overstates what the workload
//! may use; the cgroup limit is the figure that matters there.

pub mod parser;
