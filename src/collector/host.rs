//! Read-only view of the host shared by all providers of a run.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collector::provider::ProviderError;
use crate::collector::traits::{CommandOutput, CommandRunner, FileSystem, RealCommands, RealFs};

/// Everything a provider may observe: files, commands, environment variables
/// and the OS name.
///
/// Cloning is cheap; every spawned provider task gets its own clone.
#[derive(Clone)]
pub struct HostContext {
    fs: Arc<dyn FileSystem>,
    commands: Arc<dyn CommandRunner>,
    env: Arc<HashMap<String, String>>,
    os: String,
    arch: String,
    parallelism: Option<usize>,
    proc_path: PathBuf,
    sys_path: PathBuf,
}

impl HostContext {
    const DEFAULT_PROC_PATH: &'static str = "/proc";
    const DEFAULT_SYS_PATH: &'static str = "/sys";

    /// Context for the machine we are running on.
    pub fn local() -> Self {
        Self::new(RealFs::new(), RealCommands::new())
            .with_env(std::env::vars())
            .with_os(std::env::consts::OS)
            .with_arch(std::env::consts::ARCH)
            .with_parallelism(
                std::thread::available_parallelism()
                    .ok()
                    .map(std::num::NonZeroUsize::get),
            )
    }

    /// Context over arbitrary host access, defaulting to an x86_64 Linux host
    /// with an empty environment and unknown parallelism.
    pub fn new(fs: impl FileSystem + 'static, commands: impl CommandRunner + 'static) -> Self {
        Self {
            fs: Arc::new(fs),
            commands: Arc::new(commands),
            env: Arc::new(HashMap::new()),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            parallelism: None,
            proc_path: PathBuf::from(Self::DEFAULT_PROC_PATH),
            sys_path: PathBuf::from(Self::DEFAULT_SYS_PATH),
        }
    }

    pub fn with_env<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Arc::new(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn with_parallelism(mut self, parallelism: Option<usize>) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_proc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_path = path.into();
        self
    }

    pub fn with_sys_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sys_path = path.into();
        self
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// OS name in `std::env::consts::OS` form (`linux`, `macos`, ...).
    pub fn os(&self) -> &str {
        &self.os
    }

    /// CPU architecture in `std::env::consts::ARCH` form.
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Parallelism the process may use, as the runtime reports it.
    pub fn parallelism(&self) -> Option<usize> {
        self.parallelism
    }

    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Path below the proc root (`proc("meminfo")` -> `/proc/meminfo`).
    pub fn proc(&self, relative: &str) -> PathBuf {
        self.proc_path.join(relative)
    }

    /// Path below the sys root.
    pub fn sys(&self, relative: &str) -> PathBuf {
        self.sys_path.join(relative)
    }

    /// Reads a file, mapping errors to [`ProviderError::Io`].
    pub fn read(&self, path: &Path) -> Result<String, ProviderError> {
        self.fs
            .read_to_string(path)
            .map_err(|source| ProviderError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Reads a file that may legitimately be absent.
    pub fn read_optional(&self, path: &Path) -> Option<String> {
        self.fs.read_to_string(path).ok()
    }

    /// Runs a command and returns its raw output, including non-zero exits.
    ///
    /// A missing executable is reported as [`ProviderError::Unavailable`].
    pub async fn run_output(
        &self,
        program: &str,
        args: &[&str],
    ) -> Result<CommandOutput, ProviderError> {
        match self.commands.run(program, args).await {
            Ok(output) => Ok(output),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ProviderError::Unavailable(
                format!("{program} is not installed"),
            )),
            Err(source) => Err(ProviderError::Spawn {
                program: program.to_string(),
                source,
            }),
        }
    }

    /// Runs a command and returns its stdout, treating a non-zero exit as
    /// failure.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<String, ProviderError> {
        let output = self.run_output(program, args).await?;
        if !output.is_success() {
            return Err(ProviderError::CommandFailed {
                program: program.to_string(),
                code: output
                    .code
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}
