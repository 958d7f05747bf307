//! Manual redeploy: what the installed deploy script does, run in-process.

use crate::config::SiteConfig;
use crate::error::Result;
use crate::hooks::DeployLog;
use crate::host::{CommandRunner, HostPaths, layout};
use crate::repo::{Ownership, RepoSync, SyncOutcome, short};

pub struct Redeployer<'a> {
    runner: &'a dyn CommandRunner,
    site: &'a SiteConfig,
    paths: &'a HostPaths,
}

impl<'a> Redeployer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, site: &'a SiteConfig, paths: &'a HostPaths) -> Self {
        Self {
            runner,
            site,
            paths,
        }
    }

    /// Re-sync the webroot and append one line to the deploy log.
    pub fn run(&self) -> Result<SyncOutcome> {
        let sync = RepoSync::new(self.runner, self.paths, Ownership::for_site(self.site));
        let outcome = sync.sync(self.site.repo_url(), self.site.webroot(), self.site.branch())?;

        let log = DeployLog::new(self.paths.resolve(layout::deploy_log(self.site.domain())));
        log.append(&format!(
            "deployed {} {}",
            self.site.branch(),
            short(outcome.head())
        ))?;
        Ok(outcome)
    }
}
