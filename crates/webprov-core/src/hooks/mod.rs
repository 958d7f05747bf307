//! Push-to-deploy installation.
//!
//! Three artifacts are written on every run: the deploy script, the hooks
//! descriptor carrying the shared secret, and the systemd unit that keeps
//! the webhook daemon listening on the local port. The daemon is then
//! (re)enabled and restarted.

mod artifacts;
mod descriptor;
mod log;
mod secret;

use std::path::PathBuf;

pub use artifacts::{deploy_script, hook_set, service_unit};
pub use descriptor::{
    Dispatch, HookDefinition, HookSet, MatchKind, MatchRule, Parameter, ParameterSource,
    SIGNATURE_HEADER, TriggerRule,
};
pub use log::DeployLog;
pub use secret::{DeploySecret, SECRET_BYTES};

use crate::config::SiteConfig;
use crate::error::{ProvisionError, Result};
use crate::host::{self, CommandRunner, HostCommand, HostPaths, layout};
use crate::types::StepOutcome;

pub struct DeployHookInstaller<'a> {
    runner: &'a dyn CommandRunner,
    paths: &'a HostPaths,
}

impl<'a> DeployHookInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, paths: &'a HostPaths) -> Self {
        Self { runner, paths }
    }

    pub fn install(
        &self,
        site: &SiteConfig,
        secret: &DeploySecret,
        webhook_port: u16,
    ) -> Result<StepOutcome> {
        let script_changed = host::sync_file(
            &self.paths.resolve(layout::deploy_script(site.domain())),
            &deploy_script(site),
            0o755,
        )?;

        let hooks_path = self.paths.resolve(layout::hooks_file());
        let hooks_json = hook_set(site, secret).to_json()?;
        // Holds the secret: readable by the service group only.
        let hooks_changed = host::sync_file(&hooks_path, &hooks_json, 0o640)?;
        self.runner.run_checked(
            &HostCommand::new("chown")
                .arg(format!("root:{}", site.service_group()))
                .path_arg(&hooks_path),
        )?;

        let binary = self.webhook_binary();
        let unit_changed = host::sync_file(
            &self.paths.resolve(layout::webhook_unit_file()),
            &service_unit(site, &binary, webhook_port),
            0o644,
        )?;

        self.prepare_log(site)?;
        self.restart_service()?;

        tracing::info!(
            port = webhook_port,
            script_changed,
            unit_changed,
            "webhook listener installed"
        );
        Ok(StepOutcome::changed(
            script_changed || hooks_changed || unit_changed,
        ))
    }

    fn webhook_binary(&self) -> PathBuf {
        self.runner
            .find_executable("webhook")
            .unwrap_or_else(|| PathBuf::from(layout::BIN_DIR).join("webhook"))
    }

    /// The daemon runs unprivileged, so the log must be writable by it.
    fn prepare_log(&self, site: &SiteConfig) -> Result<()> {
        let log = self.paths.resolve(layout::deploy_log(site.domain()));
        if let Some(parent) = log.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log)
            .map_err(|e| ProvisionError::io(&log, e))?;
        self.runner.run_checked(
            &HostCommand::new("chown")
                .arg(site.owner_spec())
                .path_arg(&log),
        )?;
        Ok(())
    }

    fn restart_service(&self) -> Result<()> {
        let unit = layout::WEBHOOK_UNIT;
        let steps = [
            HostCommand::new("systemctl").arg("daemon-reload"),
            HostCommand::new("systemctl").args(["enable", unit]),
            HostCommand::new("systemctl").args(["restart", unit]),
        ];
        for cmd in &steps {
            self.runner
                .run_checked(cmd)
                .map_err(|e| ProvisionError::Service {
                    unit: unit.to_string(),
                    reason: format!("{:#}", e),
                })?;
        }
        Ok(())
    }
}
