//! Working-copy synchronisation for the webroot.
//!
//! Two states: no working copy (clone it) or a working copy (fast-forward
//! it). History is never rewritten; a diverged branch is an error and the
//! working copy is left as it was.

use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::error::{ProvisionError, Result};
use crate::host::{CommandRunner, HostCommand, HostPaths};
use crate::types::StepOutcome;

/// Permission bits applied recursively to the webroot.
pub const WEBROOT_MODE: &str = "755";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Absent,
    Present,
}

impl SyncState {
    pub fn of(path: &Path) -> Self {
        if path.join(".git").exists() {
            Self::Present
        } else {
            Self::Absent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned { head: String },
    FastForwarded { from: String, to: String },
    UpToDate { head: String },
}

impl SyncOutcome {
    pub fn head(&self) -> &str {
        match self {
            SyncOutcome::Cloned { head } | SyncOutcome::UpToDate { head } => head,
            SyncOutcome::FastForwarded { to, .. } => to,
        }
    }

    pub fn step_outcome(&self) -> StepOutcome {
        StepOutcome::changed(!matches!(self, SyncOutcome::UpToDate { .. }))
    }

    pub fn describe(&self) -> String {
        match self {
            SyncOutcome::Cloned { head } => format!("cloned at {}", short(head)),
            SyncOutcome::FastForwarded { from, to } => {
                format!("fast-forwarded {}..{}", short(from), short(to))
            }
            SyncOutcome::UpToDate { head } => format!("up to date at {}", short(head)),
        }
    }
}

/// Abbreviated commit id for display.
pub fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Owner and mode normalised after every sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owner: String,
    pub mode: String,
}

impl Ownership {
    pub fn for_site(site: &SiteConfig) -> Self {
        Self {
            owner: site.owner_spec(),
            mode: WEBROOT_MODE.to_string(),
        }
    }
}

pub struct RepoSync<'a> {
    runner: &'a dyn CommandRunner,
    paths: &'a HostPaths,
    ownership: Ownership,
}

impl<'a> RepoSync<'a> {
    pub fn new(runner: &'a dyn CommandRunner, paths: &'a HostPaths, ownership: Ownership) -> Self {
        Self {
            runner,
            paths,
            ownership,
        }
    }

    /// Clone or fast-forward `local_path` (a logical path) to `branch` of `remote_url`.
    pub fn sync(&self, remote_url: &str, local_path: &Path, branch: &str) -> Result<SyncOutcome> {
        let dir = self.paths.resolve(local_path);
        let outcome = match SyncState::of(&dir) {
            SyncState::Absent => self.clone_into(remote_url, &dir, branch)?,
            SyncState::Present => self.fast_forward(&dir, branch)?,
        };
        self.normalize(&dir)?;
        tracing::info!(path = %local_path.display(), "{}", outcome.describe());
        Ok(outcome)
    }

    fn clone_into(&self, remote_url: &str, dir: &Path, branch: &str) -> Result<SyncOutcome> {
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
        }
        let clone = HostCommand::new("git")
            .args(["clone", "--branch", branch, "--", remote_url])
            .path_arg(dir);
        self.git(dir, &clone)?;
        let head = self.rev_parse(dir, "HEAD")?;
        Ok(SyncOutcome::Cloned { head })
    }

    fn fast_forward(&self, dir: &Path, branch: &str) -> Result<SyncOutcome> {
        let before = self.rev_parse(dir, "HEAD")?;
        self.git(dir, &git_in(dir).args(["fetch", "origin", branch]))?;
        let remote = self.rev_parse(dir, "FETCH_HEAD")?;

        if remote == before || self.is_ancestor(dir, &remote, &before)? {
            return Ok(SyncOutcome::UpToDate { head: before });
        }
        if !self.is_ancestor(dir, &before, &remote)? {
            return Err(ProvisionError::sync(
                dir,
                format!(
                    "local history has diverged from origin/{}; resolve it by hand, nothing was discarded",
                    branch
                ),
            ));
        }

        self.git(dir, &git_in(dir).args(["merge", "--ff-only", "FETCH_HEAD"]))?;
        Ok(SyncOutcome::FastForwarded {
            from: before,
            to: remote,
        })
    }

    fn normalize(&self, dir: &Path) -> Result<()> {
        let chown = HostCommand::new("chown")
            .args(["-R", self.ownership.owner.as_str()])
            .path_arg(dir);
        let chmod = HostCommand::new("chmod")
            .args(["-R", self.ownership.mode.as_str()])
            .path_arg(dir);
        for cmd in [chown, chmod] {
            self.runner
                .run_checked(&cmd)
                .map_err(|e| ProvisionError::sync(dir, format!("{:#}", e)))?;
        }
        Ok(())
    }

    fn git(&self, dir: &Path, cmd: &HostCommand) -> Result<()> {
        let output = self.runner.run(cmd)?;
        if !output.success() {
            return Err(ProvisionError::sync(
                dir,
                format!("`{}` failed: {}", cmd, output.diagnostics()),
            ));
        }
        Ok(())
    }

    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<String> {
        let cmd = git_in(dir).args(["rev-parse", rev]);
        let output = self.runner.run(&cmd)?;
        if !output.success() {
            return Err(ProvisionError::sync(
                dir,
                format!("git rev-parse {} failed: {}", rev, output.diagnostics()),
            ));
        }
        Ok(output.stdout_trimmed().to_string())
    }

    fn is_ancestor(&self, dir: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        let cmd = git_in(dir).args(["merge-base", "--is-ancestor", ancestor, descendant]);
        let output = self.runner.run(&cmd)?;
        match output.status {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ProvisionError::sync(
                dir,
                format!("git merge-base failed: {}", output.diagnostics()),
            )),
        }
    }
}

/// Git inside the working copy. After normalisation the copy belongs to the
/// service account, so it is trusted for this invocation only.
fn git_in(dir: &Path) -> HostCommand {
    HostCommand::new("git")
        .arg("-c")
        .arg(format!("safe.directory={}", dir.display()))
        .current_dir(PathBuf::from(dir))
}
