//! CpuInfo providers.

use async_trait::async_trait;

use super::{put, put_opt};
use crate::collector::host::HostContext;
use crate::collector::procfs::parser::{parse_cpuinfo, parse_global_stat, parse_loadavg};
use crate::collector::provider::{Platform, ProviderError, SourceProvider};
use crate::collector::tools::parser::{parse_lscpu, parse_number, parse_single_value};
use crate::model::{Category, Fields};

/// `/proc/cpuinfo`.
pub struct ProcfsCpuinfo;

#[async_trait]
impl SourceProvider for ProcfsCpuinfo {
    fn name(&self) -> &str {
        "procfs-cpuinfo"
    }
    fn category(&self) -> Category {
        Category::CpuInfo
    }
    fn priority(&self) -> u32 {
        10
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let info = parse_cpuinfo(&host.read(&host.proc("cpuinfo"))?)?;

        let mut fields = Fields::new();
        put_opt(&mut fields, "model_name", info.model_name);
        put_opt(&mut fields, "vendor", info.vendor);
        put(&mut fields, "logical_cpus", info.logical_cpus);
        put_opt(&mut fields, "physical_cores", info.physical_cores);
        put_opt(&mut fields, "sockets", info.sockets);
        put_opt(&mut fields, "mhz", info.mhz);
        put_opt(&mut fields, "cache_size", info.cache_size);
        Ok(fields)
    }
}

/// `lscpu`.
pub struct Lscpu;

#[async_trait]
impl SourceProvider for Lscpu {
    fn name(&self) -> &str {
        "lscpu"
    }
    fn category(&self) -> Category {
        Category::CpuInfo
    }
    fn priority(&self) -> u32 {
        20
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let info = parse_lscpu(&host.run("lscpu", &[]).await?)?;

        let mut fields = Fields::new();
        put_opt(&mut fields, "model_name", info.model_name);
        put_opt(&mut fields, "vendor", info.vendor);
        put_opt(&mut fields, "architecture", info.architecture);
        put_opt(&mut fields, "logical_cpus", info.logical_cpus);
        put_opt(&mut fields, "sockets", info.sockets);
        put_opt(&mut fields, "cores_per_socket", info.cores_per_socket);
        put_opt(&mut fields, "threads_per_core", info.threads_per_core);
        put_opt(&mut fields, "max_mhz", info.max_mhz);
        put_opt(&mut fields, "virtualization", info.virtualization);
        put_opt(&mut fields, "hypervisor_vendor", info.hypervisor_vendor);
        Ok(fields)
    }
}

/// Usage since boot from `/proc/stat`, plus load averages.
pub struct ProcfsStat;

#[async_trait]
impl SourceProvider for ProcfsStat {
    fn name(&self) -> &str {
        "procfs-stat"
    }
    fn category(&self) -> Category {
        Category::CpuInfo
    }
    fn priority(&self) -> u32 {
        30
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let stat = parse_global_stat(&host.read(&host.proc("stat"))?)?;

        let mut fields = Fields::new();
        put_opt(&mut fields, "usage_percent", stat.cpu.usage_percent());
        if let Some(content) = host.read_optional(&host.proc("loadavg")) {
            let load = parse_loadavg(&content)?;
            put(&mut fields, "load_1m", load.load1);
            put(&mut fields, "load_5m", load.load5);
            put(&mut fields, "load_15m", load.load15);
        }
        Ok(fields)
    }
}

/// `sysctl` on macOS.
pub struct SysctlCpu;

#[async_trait]
impl SourceProvider for SysctlCpu {
    fn name(&self) -> &str {
        "sysctl-cpu"
    }
    fn category(&self) -> Category {
        Category::CpuInfo
    }
    fn priority(&self) -> u32 {
        40
    }
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let brand = host.run("sysctl", &["-n", "machdep.cpu.brand_string"]).await?;
        let logical = host.run("sysctl", &["-n", "hw.logicalcpu"]).await?;
        let physical = host.run("sysctl", &["-n", "hw.physicalcpu"]).await?;

        let mut fields = Fields::new();
        put(&mut fields, "model_name", parse_single_value(&brand)?);
        put(&mut fields, "logical_cpus", parse_number(&logical)?);
        put(&mut fields, "physical_cores", parse_number(&physical)?);
        Ok(fields)
    }
}

/// Parallelism the runtime grants this process, which honours CPU affinity
/// and cgroup quotas.
pub struct RuntimeParallelism;

#[async_trait]
impl SourceProvider for RuntimeParallelism {
    fn name(&self) -> &str {
        "runtime-parallelism"
    }
    fn category(&self) -> Category {
        Category::CpuInfo
    }
    fn priority(&self) -> u32 {
        50
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let parallelism = host.parallelism().ok_or_else(|| {
            ProviderError::Unavailable("available parallelism is unknown".to_string())
        })?;

        let mut fields = Fields::new();
        put(&mut fields, "available_parallelism", parallelism);
        Ok(fields)
    }
}
