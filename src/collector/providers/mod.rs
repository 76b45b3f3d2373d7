//! Built-in providers, one module per category.
//!
//! | Category        | Providers (priority)                                                       |
//! |-----------------|----------------------------------------------------------------------------|
//! | SystemIdentity  | os-release (10), uname (20), procfs-kernel (30), sysfs-dmi (40), runtime-env (50), dmidecode (60) |
//! | CpuInfo         | procfs-cpuinfo (10), lscpu (20), procfs-stat (30), sysctl-cpu (40), runtime-parallelism (50) |
//! | MemoryInfo      | procfs-meminfo (10), free (20), cgroup-memory (30), sysctl-memory (40)     |
//! | DiskInfo        | df-root (10), lsblk (20), procfs-diskstats (30)                            |
//! | NetworkInfo     | procfs-netdev (10), ip-addr (20), hostname-ips (30), sysfs-net (40)        |
//! | SecurityPosture | procfs-status (10), id (20), kernel-hardening (30), getenforce (40), sudo-check (50) |
//!
//! `dmidecode` and `sudo-check` call `sudo -n` and are only registered when
//! elevated providers are allowed.

pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;
pub mod security;
pub mod system;

use std::sync::Arc;

use crate::collector::provider::SourceProvider;
use crate::model::{FieldValue, Fields};

const KIB: u64 = 1024;

/// Every built-in provider, in registration order.
pub fn standard_providers(allow_elevated: bool) -> Vec<Arc<dyn SourceProvider>> {
    let mut providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(system::OsRelease),
        Arc::new(system::Uname),
        Arc::new(system::ProcfsKernel),
        Arc::new(system::SysfsDmi),
        Arc::new(system::RuntimeEnv),
        Arc::new(cpu::ProcfsCpuinfo),
        Arc::new(cpu::Lscpu),
        Arc::new(cpu::ProcfsStat),
        Arc::new(cpu::SysctlCpu),
        Arc::new(cpu::RuntimeParallelism),
        Arc::new(memory::ProcfsMeminfo),
        Arc::new(memory::Free),
        Arc::new(memory::CgroupMemory),
        Arc::new(memory::SysctlMemory),
        Arc::new(disk::DfRoot),
        Arc::new(disk::Lsblk),
        Arc::new(disk::ProcfsDiskstats),
        Arc::new(network::ProcfsNetdev),
        Arc::new(network::IpAddr),
        Arc::new(network::HostnameIps),
        Arc::new(network::SysfsNet),
        Arc::new(security::ProcfsStatus),
        Arc::new(security::Id),
        Arc::new(security::KernelHardening),
        Arc::new(security::Getenforce),
    ];
    if allow_elevated {
        providers.push(Arc::new(system::Dmidecode));
        providers.push(Arc::new(security::SudoCheck));
    }
    providers
}

/// Non-finite floats have no JSON form and are left out.
fn put(fields: &mut Fields, name: &str, value: impl Into<FieldValue>) {
    let value = value.into();
    if matches!(value, FieldValue::Float(v) if !v.is_finite()) {
        return;
    }
    fields.insert(name.to_string(), value);
}

fn put_opt<V: Into<FieldValue>>(fields: &mut Fields, name: &str, value: Option<V>) {
    if let Some(value) = value {
        put(fields, name, value);
    }
}
