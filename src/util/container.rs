//! Container environment detection.
//!
//! Detects whether the observed host is a container (Docker, Kubernetes,
//! Podman, LXC, etc.) and which runtime it belongs to.

use std::fmt;
use std::path::Path;

use crate::collector::HostContext;

/// Container runtime a process runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Kubernetes,
    Docker,
    Podman,
    Containerd,
    Lxc,
}

impl ContainerRuntime {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerRuntime::Kubernetes => "kubernetes",
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
            ContainerRuntime::Containerd => "containerd",
            ContainerRuntime::Lxc => "lxc",
        }
    }
}

impl fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performs container detection using multiple methods, most specific first.
pub fn detect_container(host: &HostContext) -> Option<ContainerRuntime> {
    check_k8s_env_vars(host)
        .or_else(|| check_service_account(host))
        .or_else(|| check_container_markers(host))
        .or_else(|| check_cgroup(host))
}

/// Checks for Kubernetes environment variables.
/// These are automatically injected by K8s into all pods.
fn check_k8s_env_vars(host: &HostContext) -> Option<ContainerRuntime> {
    host.env("KUBERNETES_SERVICE_HOST")
        .map(|_| ContainerRuntime::Kubernetes)
}

/// Checks for Kubernetes service account files.
fn check_service_account(host: &HostContext) -> Option<ContainerRuntime> {
    host.fs()
        .exists(Path::new(
            "/var/run/secrets/kubernetes.io/serviceaccount/token",
        ))
        .then_some(ContainerRuntime::Kubernetes)
}

/// Checks for container marker files.
fn check_container_markers(host: &HostContext) -> Option<ContainerRuntime> {
    if host.fs().exists(Path::new("/.dockerenv")) {
        Some(ContainerRuntime::Docker)
    } else if host.fs().exists(Path::new("/run/.containerenv")) {
        Some(ContainerRuntime::Podman)
    } else {
        None
    }
}

/// Checks cgroup of PID 1 for container-specific patterns.
fn check_cgroup(host: &HostContext) -> Option<ContainerRuntime> {
    let content = host.read_optional(&host.proc("1/cgroup"))?;

    let patterns = [
        ("kubepods", ContainerRuntime::Kubernetes),
        ("docker", ContainerRuntime::Docker),
        ("libpod", ContainerRuntime::Podman),
        ("containerd", ContainerRuntime::Containerd),
        ("lxc", ContainerRuntime::Lxc),
    ];
    patterns
        .iter()
        .find(|(p, _)| content.contains(p))
        .map(|(_, runtime)| *runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockCommands, MockFs};

    fn host_with(fs: MockFs) -> HostContext {
        HostContext::new(fs, MockCommands::new())
    }

    #[test]
    fn test_bare_metal() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/cgroup", "0::/init.scope\n");
        assert_eq!(detect_container(&host_with(fs)), None);
    }

    #[test]
    fn test_k8s_env_wins() {
        let mut fs = MockFs::new();
        fs.add_file("/.dockerenv", "");
        let host = host_with(fs).with_env([("KUBERNETES_SERVICE_HOST", "10.96.0.1")]);
        assert_eq!(detect_container(&host), Some(ContainerRuntime::Kubernetes));
    }

    #[test]
    fn test_marker_files() {
        let mut fs = MockFs::new();
        fs.add_file("/.dockerenv", "");
        assert_eq!(
            detect_container(&host_with(fs)),
            Some(ContainerRuntime::Docker)
        );

        let mut fs = MockFs::new();
        fs.add_file("/run/.containerenv", "engine=\"podman-4.9\"\n");
        assert_eq!(
            detect_container(&host_with(fs)),
            Some(ContainerRuntime::Podman)
        );
    }

    #[test]
    fn test_cgroup_patterns() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/1/cgroup",
            "0::/kubepods/besteffort/pod1234/abcd\n",
        );
        assert_eq!(
            detect_container(&host_with(fs)),
            Some(ContainerRuntime::Kubernetes)
        );

        let mut fs = MockFs::new();
        fs.add_file("/proc/1/cgroup", "12:memory:/lxc/web01\n");
        assert_eq!(detect_container(&host_with(fs)), Some(ContainerRuntime::Lxc));
        assert_eq!(ContainerRuntime::Lxc.to_string(), "lxc");
    }
}
