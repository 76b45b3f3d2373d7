//! SystemIdentity providers.

use std::path::Path;

use async_trait::async_trait;

use super::{put, put_opt};
use crate::collector::host::HostContext;
use crate::collector::procfs::parser::{parse_os_release, parse_uptime};
use crate::collector::provider::{Platform, ProviderError, SourceProvider};
use crate::collector::tools::parser::{parse_single_value, parse_uname};
use crate::model::{Category, Fields};
use crate::util::{detect_ci, detect_container};

/// `/etc/os-release`, falling back to `/usr/lib/os-release`.
pub struct OsRelease;

#[async_trait]
impl SourceProvider for OsRelease {
    fn name(&self) -> &str {
        "os-release"
    }
    fn category(&self) -> Category {
        Category::SystemIdentity
    }
    fn priority(&self) -> u32 {
        10
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let content = match host.read(Path::new("/etc/os-release")) {
            Ok(content) => content,
            Err(e) => host
                .read_optional(Path::new("/usr/lib/os-release"))
                .ok_or(e)?,
        };
        let release = parse_os_release(&content)?;

        let mut fields = Fields::new();
        put_opt(&mut fields, "os_name", release.pretty_name.or(release.name));
        put_opt(&mut fields, "os_id", release.id);
        put_opt(&mut fields, "os_version", release.version_id);
        Ok(fields)
    }
}

/// `uname -snrm`.
pub struct Uname;

#[async_trait]
impl SourceProvider for Uname {
    fn name(&self) -> &str {
        "uname"
    }
    fn category(&self) -> Category {
        Category::SystemIdentity
    }
    fn priority(&self) -> u32 {
        20
    }
    fn platform(&self) -> Platform {
        Platform::Unix
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let uname = parse_uname(&host.run("uname", &["-snrm"]).await?)?;

        let mut fields = Fields::new();
        put(&mut fields, "kernel_name", uname.kernel_name);
        put(&mut fields, "hostname", uname.hostname);
        put(&mut fields, "kernel_release", uname.kernel_release);
        put(&mut fields, "architecture", uname.machine);
        Ok(fields)
    }
}

/// Kernel identity from `/proc/sys/kernel` and `/proc/uptime`.
pub struct ProcfsKernel;

#[async_trait]
impl SourceProvider for ProcfsKernel {
    fn name(&self) -> &str {
        "procfs-kernel"
    }
    fn category(&self) -> Category {
        Category::SystemIdentity
    }
    fn priority(&self) -> u32 {
        30
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let hostname = host.read(&host.proc("sys/kernel/hostname"))?;

        let mut fields = Fields::new();
        put(&mut fields, "hostname", hostname.trim());
        if let Some(release) = host.read_optional(&host.proc("sys/kernel/osrelease")) {
            put(&mut fields, "kernel_release", release.trim());
        }
        if let Some(uptime) = host.read_optional(&host.proc("uptime")) {
            put(&mut fields, "uptime_seconds", parse_uptime(&uptime)?);
        }
        Ok(fields)
    }
}

/// Vendor and product from `/sys/class/dmi/id`. Absent on most ARM boards
/// and inside containers.
pub struct SysfsDmi;

#[async_trait]
impl SourceProvider for SysfsDmi {
    fn name(&self) -> &str {
        "sysfs-dmi"
    }
    fn category(&self) -> Category {
        Category::SystemIdentity
    }
    fn priority(&self) -> u32 {
        40
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let dmi = host.sys("class/dmi/id");
        if !host.fs().exists(&dmi) {
            return Err(ProviderError::Unavailable(
                "no DMI information exposed".to_string(),
            ));
        }

        let mut fields = Fields::new();
        for (file, field) in [("sys_vendor", "system_vendor"), ("product_name", "product_name")] {
            if let Some(value) = host.read_optional(&dmi.join(file)) {
                let value = value.trim();
                if !value.is_empty() {
                    put(&mut fields, field, value);
                }
            }
        }
        Ok(fields)
    }
}

/// Facts about the process runtime: OS family, architecture, container
/// runtime and CI job.
pub struct RuntimeEnv;

#[async_trait]
impl SourceProvider for RuntimeEnv {
    fn name(&self) -> &str {
        "runtime-env"
    }
    fn category(&self) -> Category {
        Category::SystemIdentity
    }
    fn priority(&self) -> u32 {
        50
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let mut fields = Fields::new();
        put(&mut fields, "os_family", host.os());
        put(&mut fields, "architecture", host.arch());
        put(
            &mut fields,
            "container",
            detect_container(host).map_or("none", |runtime| runtime.as_str()),
        );
        if let Some(ci) = detect_ci(host.env_vars()) {
            put(&mut fields, "ci_provider", ci.provider);
            put_opt(&mut fields, "workflow", ci.workflow);
            put_opt(&mut fields, "run_id", ci.run_id);
            put_opt(&mut fields, "runner_os", ci.runner_os);
        }
        Ok(fields)
    }
}

/// `sudo -n dmidecode -s system-product-name`. Never prompts for a password.
pub struct Dmidecode;

#[async_trait]
impl SourceProvider for Dmidecode {
    fn name(&self) -> &str {
        "dmidecode"
    }
    fn category(&self) -> Category {
        Category::SystemIdentity
    }
    fn priority(&self) -> u32 {
        60
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let output = host
            .run("sudo", &["-n", "dmidecode", "-s", "system-product-name"])
            .await?;

        let mut fields = Fields::new();
        put(&mut fields, "product_name", parse_single_value(&output)?);
        Ok(fields)
    }
}
