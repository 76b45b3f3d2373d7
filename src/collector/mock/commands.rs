//! Scripted command runner for testing command-backed providers.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use async_trait::async_trait;

use crate::collector::traits::{CommandOutput, CommandRunner};

#[derive(Debug, Clone)]
struct Scripted {
    output: CommandOutput,
    delay: Option<Duration>,
}

/// Command runner that answers from a fixed script.
///
/// Commands are keyed by program and arguments joined with single spaces
/// (`"df -Pk /"`). Anything not scripted behaves like a missing executable.
#[derive(Debug, Clone, Default)]
pub struct MockCommands {
    scripts: HashMap<String, Scripted>,
}

impl MockCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful command with the given stdout.
    pub fn add(&mut self, command_line: &str, stdout: impl Into<String>) {
        self.add_output(command_line, CommandOutput::success(stdout));
    }

    /// Scripts an arbitrary output, e.g. a non-zero exit.
    pub fn add_output(&mut self, command_line: &str, output: CommandOutput) {
        self.scripts.insert(
            command_line.to_string(),
            Scripted {
                output,
                delay: None,
            },
        );
    }

    /// Scripts a command that only answers after `delay`.
    pub fn add_slow(&mut self, command_line: &str, stdout: impl Into<String>, delay: Duration) {
        self.scripts.insert(
            command_line.to_string(),
            Scripted {
                output: CommandOutput::success(stdout),
                delay: Some(delay),
            },
        );
    }

    /// Removes a scripted command so it behaves as not installed.
    pub fn remove(&mut self, command_line: &str) {
        self.scripts.remove(command_line);
    }
}

#[async_trait]
impl CommandRunner for MockCommands {
    async fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let mut key = program.to_string();
        for arg in args {
            key.push(' ');
            key.push_str(arg);
        }

        let Some(script) = self.scripts.get(&key) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{program}: command not found"),
            ));
        };

        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(script.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_and_missing() {
        let mut commands = MockCommands::new();
        commands.add("uname -snrm", "Linux box 6.8.0 x86_64\n");
        commands.add_output("getenforce", CommandOutput::failure(1, "disabled"));

        let out = commands.run("uname", &["-snrm"]).await.unwrap();
        assert!(out.is_success());
        assert_eq!(out.stdout, "Linux box 6.8.0 x86_64\n");

        let out = commands.run("getenforce", &[]).await.unwrap();
        assert_eq!(out.code, Some(1));

        let err = commands.run("lscpu", &[]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
