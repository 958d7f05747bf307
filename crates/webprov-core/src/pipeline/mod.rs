//! The provisioning pipeline.
//!
//! Steps run in a fixed order and each one is idempotent. Everything up to
//! and including the webhook install is fatal on error; the certificate
//! request is reported and the run still completes.

mod deploy;
mod report;

pub use deploy::Redeployer;
pub use report::{ProvisionReport, StepReport};

use crate::cert::CertProvisioner;
use crate::config::SiteConfig;
use crate::error::Result;
use crate::hooks::{DeployHookInstaller, DeploySecret};
use crate::host::{CommandRunner, HostPaths};
use crate::install::{PackageInstaller, PackageSpec};
use crate::probe::ServiceProbe;
use crate::repo::{Ownership, RepoSync};
use crate::types::StepOutcome;
use crate::vhost::VHostRenderer;

pub struct Provisioner<'a> {
    runner: &'a dyn CommandRunner,
    site: &'a SiteConfig,
    paths: &'a HostPaths,
}

impl<'a> Provisioner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, site: &'a SiteConfig, paths: &'a HostPaths) -> Self {
        Self {
            runner,
            site,
            paths,
        }
    }

    pub fn run(&self) -> Result<ProvisionReport> {
        let site = self.site;
        let installer = PackageInstaller::new(self.runner, self.paths);
        let mut steps = Vec::new();

        let detection = ServiceProbe::new(self.runner, &installer).detect()?;
        let kind = detection.capabilities.web_server;
        let detail = match detection.outcome {
            StepOutcome::Changed => format!("{} installed and started", kind.as_str()),
            _ => format!("{} already active", kind.as_str()),
        };
        steps.push(step("Web server", detection.outcome, detail));

        for spec in PackageSpec::site_requirements(site) {
            let outcome = installer.ensure(&spec)?;
            let detail = match outcome {
                StepOutcome::Changed => "installed".to_string(),
                _ => "already installed".to_string(),
            };
            steps.push(step(&format!("Package {}", spec.package), outcome, detail));
        }

        let sync = RepoSync::new(self.runner, self.paths, Ownership::for_site(site));
        let synced = sync.sync(site.repo_url(), site.webroot(), site.branch())?;
        steps.push(step(
            "Repository",
            synced.step_outcome(),
            format!("{} {}", site.webroot().display(), synced.describe()),
        ));

        let vhosts =
            VHostRenderer::new(self.runner, self.paths).render(kind, site, site.webhook_port())?;
        for vhost in vhosts {
            steps.push(step(
                &format!("Virtual host ({})", vhost.flavor),
                vhost.outcome,
                vhost.path.display().to_string(),
            ));
        }

        let secret = DeploySecret::generate();
        let hooks = DeployHookInstaller::new(self.runner, self.paths).install(
            site,
            &secret,
            site.webhook_port(),
        )?;
        steps.push(step(
            "Webhook listener",
            hooks,
            format!("listening on 127.0.0.1:{}", site.webhook_port()),
        ));

        let aliases = vec![site.www_alias()];
        let certificate = CertProvisioner::new(self.runner, &installer).ensure(
            site.domain(),
            &aliases,
            kind,
            site.contact_email(),
        );

        Ok(ProvisionReport {
            domain: site.domain().to_string(),
            aliases,
            webhook_url: site.webhook_url(),
            capabilities: detection.capabilities,
            steps,
            secret,
            certificate,
        })
    }
}

fn step(name: &str, outcome: StepOutcome, detail: String) -> StepReport {
    StepReport {
        name: name.to_string(),
        outcome,
        detail,
    }
}
