//! MemoryInfo providers. All sizes are reported in bytes.

use async_trait::async_trait;

use super::{KIB, put, put_opt};
use crate::collector::cgroup::parser::{parse_memory_current, parse_memory_max, parse_unified_path};
use crate::collector::host::HostContext;
use crate::collector::procfs::parser::parse_meminfo;
use crate::collector::provider::{Platform, ProviderError, SourceProvider};
use crate::collector::tools::parser::{parse_free, parse_number};
use crate::model::{Category, Fields};

/// `/proc/meminfo`.
pub struct ProcfsMeminfo;

#[async_trait]
impl SourceProvider for ProcfsMeminfo {
    fn name(&self) -> &str {
        "procfs-meminfo"
    }
    fn category(&self) -> Category {
        Category::MemoryInfo
    }
    fn priority(&self) -> u32 {
        10
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let info = parse_meminfo(&host.read(&host.proc("meminfo"))?)?;

        let mut fields = Fields::new();
        let bytes = |kb: Option<u64>| kb.map(|kb| kb.saturating_mul(KIB));
        put(&mut fields, "total_bytes", info.mem_total.saturating_mul(KIB));
        put_opt(&mut fields, "free_bytes", bytes(info.mem_free));
        put_opt(&mut fields, "available_bytes", bytes(info.mem_available));
        put_opt(&mut fields, "swap_total_bytes", bytes(info.swap_total));
        put_opt(&mut fields, "swap_free_bytes", bytes(info.swap_free));
        put_opt(&mut fields, "usage_percent", info.usage_percent());
        Ok(fields)
    }
}

/// `free -b`.
pub struct Free;

#[async_trait]
impl SourceProvider for Free {
    fn name(&self) -> &str {
        "free"
    }
    fn category(&self) -> Category {
        Category::MemoryInfo
    }
    fn priority(&self) -> u32 {
        20
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let free = parse_free(&host.run("free", &["-b"]).await?)?;

        let mut fields = Fields::new();
        put(&mut fields, "total_bytes", free.total);
        put_opt(&mut fields, "free_bytes", free.free);
        put_opt(&mut fields, "available_bytes", free.available);
        put_opt(&mut fields, "swap_total_bytes", free.swap_total);
        put_opt(&mut fields, "swap_free_bytes", free.swap_free);
        Ok(fields)
    }
}

/// Cgroup v2 limit and usage of the collector's own cgroup.
pub struct CgroupMemory;

#[async_trait]
impl SourceProvider for CgroupMemory {
    fn name(&self) -> &str {
        "cgroup-memory"
    }
    fn category(&self) -> Category {
        Category::MemoryInfo
    }
    fn priority(&self) -> u32 {
        30
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let unified = host
            .read_optional(&host.proc("self/cgroup"))
            .and_then(|content| parse_unified_path(&content))
            .ok_or_else(|| ProviderError::Unavailable("cgroup v2 is not in use".to_string()))?;
        let dir = host
            .sys("fs/cgroup")
            .join(unified.trim_start_matches('/'));

        let current_path = dir.join("memory.current");
        if !host.fs().exists(&current_path) {
            return Err(ProviderError::Unavailable(
                "memory controller is not enabled for this cgroup".to_string(),
            ));
        }

        let mut fields = Fields::new();
        put(
            &mut fields,
            "cgroup_usage_bytes",
            parse_memory_current(&host.read(&current_path)?)?,
        );
        if let Some(max) = host.read_optional(&dir.join("memory.max")) {
            put_opt(&mut fields, "cgroup_limit_bytes", parse_memory_max(&max)?);
        }
        Ok(fields)
    }
}

/// `sysctl -n hw.memsize` on macOS.
pub struct SysctlMemory;

#[async_trait]
impl SourceProvider for SysctlMemory {
    fn name(&self) -> &str {
        "sysctl-memory"
    }
    fn category(&self) -> Category {
        Category::MemoryInfo
    }
    fn priority(&self) -> u32 {
        40
    }
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let output = host.run("sysctl", &["-n", "hw.memsize"]).await?;

        let mut fields = Fields::new();
        put(&mut fields, "total_bytes", parse_number(&output)?);
        Ok(fields)
    }
}
