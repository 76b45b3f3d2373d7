//! The provider contract and its error boundary.
//!
//! A provider only has to produce fields or an error. [`invoke`] turns that
//! into a [`RawResult`], applying the platform predicate, the timeout and the
//! empty-success rule, so no provider error ever crosses this boundary.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::collector::host::HostContext;
use crate::collector::procfs::ParseError;
use crate::model::{Category, Fields, RawResult};

/// Error message recorded for invocations that exceed their timeout.
pub const TIMEOUT_ERROR: &str = "timeout";

/// Platform compatibility predicate, checked before a provider is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Any,
    Linux,
    /// Any Unix-like OS, including macOS and the BSDs.
    Unix,
    MacOs,
}

impl Platform {
    /// Whether a host reporting `os` (`std::env::consts::OS` form) qualifies.
    pub fn supports(self, os: &str) -> bool {
        match self {
            Platform::Any => true,
            Platform::Linux => os == "linux",
            Platform::MacOs => os == "macos",
            Platform::Unix => matches!(
                os,
                "linux"
                    | "macos"
                    | "freebsd"
                    | "netbsd"
                    | "openbsd"
                    | "dragonfly"
                    | "solaris"
                    | "illumos"
                    | "android"
            ),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Any => "any",
            Platform::Linux => "linux",
            Platform::Unix => "unix",
            Platform::MacOs => "macos",
        })
    }
}

/// Why a provider could not produce fields.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The backend does not exist on this host. Reported as `Unavailable`.
    #[error("{0}")]
    Unavailable(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with status {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: String,
        stderr: String,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A single data-gathering unit bound to one backend.
///
/// Implementations observe the host through [`HostContext`] only and must
/// not keep state between invocations.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Unique provider name, used for provenance.
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// Default priority; lower wins. The registry may override it.
    fn priority(&self) -> u32;

    fn platform(&self) -> Platform {
        Platform::Any
    }

    /// Provider-specific timeout, if it differs from the run default.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError>;
}

/// Invokes a provider once and converts every outcome into a [`RawResult`].
pub async fn invoke(
    provider: &dyn SourceProvider,
    priority: u32,
    host: &HostContext,
    timeout: Duration,
) -> RawResult {
    let name = provider.name();
    let category = provider.category();
    let platform = provider.platform();

    if !platform.supports(host.os()) {
        return RawResult::unavailable(
            name,
            category,
            priority,
            format!("requires {platform}, host is {}", host.os()),
        );
    }

    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, provider.fetch(host)).await {
        Err(_) => RawResult::failed(name, category, priority, TIMEOUT_ERROR),
        Ok(Ok(fields)) => RawResult::ok(name, category, priority, fields),
        Ok(Err(ProviderError::Unavailable(reason))) => {
            RawResult::unavailable(name, category, priority, reason)
        }
        Ok(Err(e)) => RawResult::failed(name, category, priority, e.to_string()),
    };
    result.with_duration(start.elapsed())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned providers for collector and registry tests.

    use super::*;
    use crate::model::FieldValue;

    pub enum Behavior {
        Fields(Vec<(&'static str, FieldValue)>),
        Fail(&'static str),
        Unavailable,
        Empty,
        Sleep(Duration),
        Panic,
    }

    pub struct StubProvider {
        pub name: &'static str,
        pub category: Category,
        pub priority: u32,
        pub platform: Platform,
        pub behavior: Behavior,
    }

    impl StubProvider {
        pub fn new(
            name: &'static str,
            category: Category,
            priority: u32,
            behavior: Behavior,
        ) -> Self {
            Self {
                name,
                category,
                priority,
                platform: Platform::Any,
                behavior,
            }
        }

        pub fn on(mut self, platform: Platform) -> Self {
            self.platform = platform;
            self
        }
    }

    #[async_trait]
    impl SourceProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn category(&self) -> Category {
            self.category
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn platform(&self) -> Platform {
            self.platform
        }

        async fn fetch(&self, _host: &HostContext) -> Result<Fields, ProviderError> {
            match &self.behavior {
                Behavior::Fields(values) => Ok(values
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect()),
                Behavior::Fail(msg) => Err(ProviderError::CommandFailed {
                    program: self.name.to_string(),
                    code: "1".to_string(),
                    stderr: (*msg).to_string(),
                }),
                Behavior::Unavailable => {
                    Err(ProviderError::Unavailable("not on this host".to_string()))
                }
                Behavior::Empty => Ok(Fields::new()),
                Behavior::Sleep(d) => {
                    tokio::time::sleep(*d).await;
                    Ok(Fields::from([("late".to_string(), FieldValue::Int(1))]))
                }
                Behavior::Panic => panic!("provider {} blew up", self.name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Behavior, StubProvider};
    use super::*;
    use crate::collector::mock::{MockCommands, MockFs};
    use crate::model::{FetchStatus, FieldValue};

    fn host() -> HostContext {
        HostContext::new(MockFs::new(), MockCommands::new())
    }

    #[test]
    fn test_platform_predicate() {
        assert!(Platform::Any.supports("windows"));
        assert!(Platform::Linux.supports("linux"));
        assert!(!Platform::Linux.supports("macos"));
        assert!(Platform::Unix.supports("macos"));
        assert!(!Platform::Unix.supports("windows"));
        assert!(Platform::MacOs.supports("macos"));
    }

    #[tokio::test]
    async fn test_invoke_ok() {
        let p = StubProvider::new(
            "meminfo",
            Category::MemoryInfo,
            1,
            Behavior::Fields(vec![("total", FieldValue::from("16384 MB"))]),
        );
        let raw = invoke(&p, 1, &host(), Duration::from_secs(1)).await;
        assert_eq!(raw.status, FetchStatus::Ok);
        assert_eq!(raw.provider_name, "meminfo");
        assert_eq!(raw.fields["total"], FieldValue::from("16384 MB"));
    }

    #[tokio::test]
    async fn test_invoke_platform_mismatch_is_unavailable() {
        let p = StubProvider::new(
            "sysctl",
            Category::CpuInfo,
            1,
            Behavior::Fields(vec![("x", FieldValue::Int(1))]),
        )
        .on(Platform::MacOs);
        let raw = invoke(&p, 1, &host(), Duration::from_secs(1)).await;
        assert_eq!(raw.status, FetchStatus::Unavailable);
        assert_eq!(raw.error.as_deref(), Some("requires macos, host is linux"));
    }

    #[tokio::test]
    async fn test_invoke_error_kinds() {
        let host = host();

        let failing = StubProvider::new("f", Category::DiskInfo, 1, Behavior::Fail("boom"));
        let raw = invoke(&failing, 1, &host, Duration::from_secs(1)).await;
        assert_eq!(raw.status, FetchStatus::Failed);
        assert!(raw.error.unwrap().contains("boom"));

        let missing = StubProvider::new("m", Category::DiskInfo, 2, Behavior::Unavailable);
        let raw = invoke(&missing, 2, &host, Duration::from_secs(1)).await;
        assert_eq!(raw.status, FetchStatus::Unavailable);

        let empty = StubProvider::new("e", Category::DiskInfo, 3, Behavior::Empty);
        let raw = invoke(&empty, 3, &host, Duration::from_secs(1)).await;
        assert_eq!(raw.status, FetchStatus::Failed);
        assert!(raw.fields.is_empty());
    }

    #[tokio::test]
    async fn test_invoke_timeout() {
        let slow = StubProvider::new(
            "slow",
            Category::NetworkInfo,
            1,
            Behavior::Sleep(Duration::from_secs(30)),
        );
        let start = Instant::now();
        let raw = invoke(&slow, 1, &host(), Duration::from_millis(50)).await;
        assert_eq!(raw.status, FetchStatus::Failed);
        assert_eq!(raw.error.as_deref(), Some(TIMEOUT_ERROR));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
