//! Scripted host: services, packages and validators are simulated; git can
//! run for real against local fixture repositories.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;

use webprov_core::host::{CommandOutput, CommandRunner, HostCommand};

use super::git::git_command;

#[derive(Debug, Default)]
struct State {
    active: HashSet<String>,
    executables: HashSet<String>,
    packages: HashSet<String>,
    unavailable: HashSet<String>,
    failing: Vec<String>,
    reject_config: bool,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    state: RefCell<State>,
    real_git: bool,
}

impl FakeHost {
    /// A fresh host: nothing running, nothing installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `git` commands for real.
    pub fn with_real_git(mut self) -> Self {
        self.real_git = true;
        self
    }

    pub fn with_active(self, unit: &str) -> Self {
        self.state.borrow_mut().active.insert(unit.to_string());
        self
    }

    pub fn with_executable(self, name: &str) -> Self {
        self.state.borrow_mut().executables.insert(name.to_string());
        self
    }

    /// apt cannot install this package.
    pub fn with_unavailable_package(self, package: &str) -> Self {
        self.state
            .borrow_mut()
            .unavailable
            .insert(package.to_string());
        self
    }

    /// Commands whose display starts with `prefix` exit non-zero.
    pub fn fail_on(self, prefix: &str) -> Self {
        self.state.borrow_mut().failing.push(prefix.to_string());
        self
    }

    pub fn set_reject_config(&self, reject: bool) {
        self.state.borrow_mut().reject_config = reject;
    }

    pub fn is_active(&self, unit: &str) -> bool {
        self.state.borrow().active.contains(unit)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn simulate(&self, program: &str, args: &[&str], line: &str) -> CommandOutput {
        let mut state = self.state.borrow_mut();
        if state.failing.iter().any(|prefix| line.starts_with(prefix)) {
            return CommandOutput::failed(1, format!("simulated failure: {}", line));
        }
        match (program, args) {
            ("systemctl", ["is-active", "--quiet", unit]) => {
                if state.active.contains(*unit) {
                    CommandOutput::ok("")
                } else {
                    CommandOutput::failed(3, "")
                }
            }
            ("systemctl", ["enable", "--now", unit])
            | ("systemctl", ["restart", unit])
            | ("systemctl", ["start", unit]) => {
                state.active.insert(unit.to_string());
                CommandOutput::ok("")
            }
            ("apt-get", ["install", "-y", package]) => {
                if state.unavailable.contains(*package) {
                    return CommandOutput::failed(
                        100,
                        format!("E: Unable to locate package {}", package),
                    );
                }
                state.packages.insert(package.to_string());
                if let Some(binary) = binary_for(package) {
                    state.executables.insert(binary.to_string());
                }
                CommandOutput::ok("")
            }
            ("dpkg-query", [.., package]) => {
                if state.packages.contains(*package) {
                    CommandOutput::ok("install ok installed")
                } else {
                    CommandOutput::failed(1, format!("no packages found matching {}", package))
                }
            }
            ("nginx", ["-t"]) | ("apachectl", ["configtest"]) => {
                if state.reject_config {
                    CommandOutput::failed(1, "emerg: unexpected end of file")
                } else {
                    CommandOutput::ok("syntax is ok")
                }
            }
            _ => CommandOutput::ok(""),
        }
    }
}

fn binary_for(package: &str) -> Option<&str> {
    match package {
        "nodejs" => Some("node"),
        "apache2" => Some("apachectl"),
        p if p.starts_with("python3-") => None,
        p => Some(p),
    }
}

fn run_real_git(command: &HostCommand) -> anyhow::Result<CommandOutput> {
    let mut cmd = git_command();
    cmd.args(command.get_args());
    if let Some(dir) = command.get_current_dir() {
        cmd.current_dir(dir);
    }
    let output = cmd.output()?;
    Ok(CommandOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

impl CommandRunner for FakeHost {
    fn run(&self, command: &HostCommand) -> anyhow::Result<CommandOutput> {
        let line = command.to_string();
        self.state.borrow_mut().calls.push(line.clone());

        if command.program() == "git" && self.real_git {
            let failing = self
                .state
                .borrow()
                .failing
                .iter()
                .any(|prefix| line.starts_with(prefix));
            if !failing {
                return run_real_git(command);
            }
        }

        let args: Vec<&str> = command.get_args().iter().map(String::as_str).collect();
        Ok(self.simulate(command.program(), &args, &line))
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.state
            .borrow()
            .executables
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }
}
