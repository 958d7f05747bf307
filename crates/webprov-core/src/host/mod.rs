//! Access to the host operating system.
//!
//! Every step reaches external programs through [`CommandRunner`] and the
//! filesystem through [`HostPaths`], so the whole pipeline can run against
//! a temporary root with a scripted runner.

mod files;
pub mod layout;
mod paths;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;

pub use files::{read_existing, sync_file, write_file};
pub use paths::HostPaths;

/// An external command with its arguments, environment and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_envs(&self) -> &[(String, String)] {
        &self.envs
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Stderr and stdout joined, for reporting validator and tool failures.
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        match (stderr.is_empty(), stdout.is_empty()) {
            (false, false) => format!("{}\n{}", stderr, stdout),
            (false, true) => stderr.to_string(),
            (true, false) => stdout.to_string(),
            (true, true) => match self.status {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            },
        }
    }
}

/// Runs external programs on the host.
pub trait CommandRunner {
    /// Run a command to completion. `Err` means the program could not be
    /// started at all; a non-zero exit is reported through the output.
    fn run(&self, command: &HostCommand) -> anyhow::Result<CommandOutput>;

    /// Resolve an executable on the search path.
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Run a command and fail on a non-zero exit status.
    fn run_checked(&self, command: &HostCommand) -> anyhow::Result<CommandOutput> {
        let output = self.run(command)?;
        if !output.success() {
            anyhow::bail!("`{}` failed: {}", command, output.diagnostics());
        }
        Ok(output)
    }
}

/// Runs commands on the real host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &HostCommand) -> anyhow::Result<CommandOutput> {
        tracing::debug!(%command, "running");
        let mut cmd = Command::new(command.program());
        cmd.args(command.get_args());
        for (key, value) in command.get_envs() {
            cmd.env(key, value);
        }
        if let Some(dir) = command.get_current_dir() {
            cmd.current_dir(dir);
        }
        let output = cmd
            .output()
            .with_context(|| format!("Failed to run {}", command.program()))?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = HostCommand::new("apt-get")
            .args(["install", "-y", "nginx"])
            .env("DEBIAN_FRONTEND", "noninteractive");
        assert_eq!(cmd.to_string(), "apt-get install -y nginx");
        assert_eq!(cmd.get_envs().len(), 1);
    }

    #[test]
    fn diagnostics_prefers_stderr_then_stdout() {
        let out = CommandOutput {
            status: Some(1),
            stdout: "syntax is ok\n".to_string(),
            stderr: "emerg: unexpected \"}\"\n".to_string(),
        };
        assert_eq!(out.diagnostics(), "emerg: unexpected \"}\"\nsyntax is ok");
        assert_eq!(
            CommandOutput::failed(2, "").diagnostics(),
            "exited with status 2"
        );
    }

    #[test]
    fn system_runner_reports_exit_status() {
        let runner = SystemRunner::new();
        let out = runner.run(&HostCommand::new("sh").args(["-c", "exit 3"])).unwrap();
        assert_eq!(out.status, Some(3));
        assert!(runner.run_checked(&HostCommand::new("true")).is_ok());
        assert!(runner.run_checked(&HostCommand::new("false")).is_err());
    }

    #[test]
    fn system_runner_missing_program_is_error() {
        let runner = SystemRunner::new();
        assert!(
            runner
                .run(&HostCommand::new("webprov-definitely-not-installed"))
                .is_err()
        );
        assert!(
            runner
                .find_executable("webprov-definitely-not-installed")
                .is_none()
        );
    }
}
