//! SecurityPosture providers.

use async_trait::async_trait;

use super::{put, put_opt};
use crate::collector::host::HostContext;
use crate::collector::procfs::parser::parse_proc_status;
use crate::collector::provider::{Platform, ProviderError, SourceProvider};
use crate::collector::tools::parser::{parse_number, parse_single_value};
use crate::model::{Category, Fields};

/// Kernel seccomp mode name; modes this build does not know are left out.
fn seccomp_mode(mode: u32) -> Option<&'static str> {
    match mode {
        0 => Some("disabled"),
        1 => Some("strict"),
        2 => Some("filter"),
        _ => None,
    }
}

fn aslr_mode(value: &str) -> Option<&'static str> {
    match value.trim() {
        "0" => Some("disabled"),
        "1" => Some("partial"),
        "2" => Some("full"),
        _ => None,
    }
}

/// `/proc/self/status` of the collector process.
pub struct ProcfsStatus;

#[async_trait]
impl SourceProvider for ProcfsStatus {
    fn name(&self) -> &str {
        "procfs-status"
    }
    fn category(&self) -> Category {
        Category::SecurityPosture
    }
    fn priority(&self) -> u32 {
        10
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let status = parse_proc_status(&host.read(&host.proc("self/status"))?)?;

        let mut fields = Fields::new();
        if let Some(uid) = status.effective_uid {
            put(&mut fields, "effective_uid", uid);
            put(&mut fields, "running_as_root", uid == 0);
        }
        put_opt(&mut fields, "no_new_privs", status.no_new_privs);
        put_opt(&mut fields, "seccomp_mode", status.seccomp.and_then(seccomp_mode));
        put_opt(&mut fields, "cap_effective", status.cap_eff);
        Ok(fields)
    }
}

/// `id -u`.
pub struct Id;

#[async_trait]
impl SourceProvider for Id {
    fn name(&self) -> &str {
        "id"
    }
    fn category(&self) -> Category {
        Category::SecurityPosture
    }
    fn priority(&self) -> u32 {
        20
    }
    fn platform(&self) -> Platform {
        Platform::Unix
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let uid = parse_number(&host.run("id", &["-u"]).await?)?;

        let mut fields = Fields::new();
        put(&mut fields, "effective_uid", uid);
        put(&mut fields, "running_as_root", uid == 0);
        Ok(fields)
    }
}

/// ASLR setting and active Linux security modules.
pub struct KernelHardening;

#[async_trait]
impl SourceProvider for KernelHardening {
    fn name(&self) -> &str {
        "kernel-hardening"
    }
    fn category(&self) -> Category {
        Category::SecurityPosture
    }
    fn priority(&self) -> u32 {
        30
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let aslr_path = host.proc("sys/kernel/randomize_va_space");
        let aslr = host.read_optional(&aslr_path);
        let lsm = host.read_optional(&host.sys("kernel/security/lsm"));
        if aslr.is_none() && lsm.is_none() {
            // Report the primary source as the cause.
            host.read(&aslr_path)?;
        }

        let mut fields = Fields::new();
        put_opt(&mut fields, "aslr", aslr.as_deref().and_then(aslr_mode));
        if let Some(lsm) = lsm {
            let modules: Vec<String> = lsm
                .trim()
                .split(',')
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            put(&mut fields, "lsm", modules);
        }
        Ok(fields)
    }
}

/// SELinux mode from `getenforce`.
pub struct Getenforce;

#[async_trait]
impl SourceProvider for Getenforce {
    fn name(&self) -> &str {
        "getenforce"
    }
    fn category(&self) -> Category {
        Category::SecurityPosture
    }
    fn priority(&self) -> u32 {
        40
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let mode = parse_single_value(&host.run("getenforce", &[]).await?)?;

        let mut fields = Fields::new();
        put(&mut fields, "selinux_mode", mode.to_lowercase());
        Ok(fields)
    }
}

/// Whether `sudo` works without a password. A refusal is a valid answer,
/// not a failure.
pub struct SudoCheck;

#[async_trait]
impl SourceProvider for SudoCheck {
    fn name(&self) -> &str {
        "sudo-check"
    }
    fn category(&self) -> Category {
        Category::SecurityPosture
    }
    fn priority(&self) -> u32 {
        50
    }
    fn platform(&self) -> Platform {
        Platform::Unix
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let output = host.run_output("sudo", &["-n", "true"]).await?;

        let mut fields = Fields::new();
        put(&mut fields, "passwordless_sudo", output.is_success());
        Ok(fields)
    }
}
