//! Virtual host rendering and activation.
//!
//! For each active web server the descriptor is written to the server's
//! available-sites directory, enabled, validated with the server's own
//! syntax check and only then reloaded. A rejected descriptor is rolled
//! back on disk so the running configuration stays the live one.

mod apache;
mod nginx;
mod template;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use template::{VHostTemplate, WEBHOOK_HOOK_ID, WEBHOOK_LOCATION};

use crate::config::SiteConfig;
use crate::error::{ProvisionError, Result};
use crate::host::{self, CommandRunner, HostCommand, HostPaths, layout};
use crate::probe::WebServerKind;
use crate::types::StepOutcome;

/// A concrete web server implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerFlavor {
    Nginx,
    Apache,
}

impl ServerFlavor {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerFlavor::Nginx => "nginx",
            ServerFlavor::Apache => "apache",
        }
    }

    /// systemd unit name.
    pub fn service_name(self) -> &'static str {
        match self {
            ServerFlavor::Nginx => "nginx",
            ServerFlavor::Apache => "apache2",
        }
    }

    /// apt package providing the server.
    pub fn package(self) -> &'static str {
        self.service_name()
    }

    /// certbot installer plugin package.
    pub fn certbot_plugin(self) -> &'static str {
        match self {
            ServerFlavor::Nginx => "python3-certbot-nginx",
            ServerFlavor::Apache => "python3-certbot-apache",
        }
    }

    /// Native syntax check for the whole server configuration.
    pub fn validate_command(self) -> HostCommand {
        match self {
            ServerFlavor::Nginx => HostCommand::new("nginx").arg("-t"),
            ServerFlavor::Apache => HostCommand::new("apachectl").arg("configtest"),
        }
    }

    /// Logical path of the site descriptor.
    pub fn available_path(self, domain: &str) -> PathBuf {
        match self {
            ServerFlavor::Nginx => Path::new(layout::NGINX_SITES_AVAILABLE).join(domain),
            ServerFlavor::Apache => {
                Path::new(layout::APACHE_SITES_AVAILABLE).join(format!("{}.conf", domain))
            }
        }
    }

    /// Logical path of the enable link.
    pub fn enabled_path(self, domain: &str) -> PathBuf {
        match self {
            ServerFlavor::Nginx => Path::new(layout::NGINX_SITES_ENABLED).join(domain),
            ServerFlavor::Apache => {
                Path::new(layout::APACHE_SITES_ENABLED).join(format!("{}.conf", domain))
            }
        }
    }
}

impl fmt::Display for ServerFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one server's descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VHostReport {
    pub flavor: ServerFlavor,
    /// Logical path of the written descriptor
    pub path: PathBuf,
    pub outcome: StepOutcome,
}

pub struct VHostRenderer<'a> {
    runner: &'a dyn CommandRunner,
    paths: &'a HostPaths,
}

impl<'a> VHostRenderer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, paths: &'a HostPaths) -> Self {
        Self { runner, paths }
    }

    /// Render, enable, validate and reload the site for every active server.
    pub fn render(
        &self,
        kind: WebServerKind,
        site: &SiteConfig,
        webhook_port: u16,
    ) -> Result<Vec<VHostReport>> {
        let template = VHostTemplate::new(site, webhook_port);
        kind.servers()
            .into_iter()
            .map(|flavor| self.apply(flavor, &template))
            .collect()
    }

    fn apply(&self, flavor: ServerFlavor, template: &VHostTemplate) -> Result<VHostReport> {
        let content = template.render(flavor);
        let logical = flavor.available_path(&template.domain);
        let available = self.paths.resolve(&logical);

        let previous = host::read_existing(&available)?;
        let changed = host::sync_file(&available, &content, 0o644)?;
        let newly_enabled = match self.enable(flavor, &template.domain, &available) {
            Ok(newly_enabled) => newly_enabled,
            Err(err) => {
                tracing::error!(%flavor, error = %err, "could not enable site, restoring previous descriptor");
                self.restore(flavor, &template.domain, &available, previous, false)?;
                return Err(err);
            }
        };

        let check = flavor.validate_command();
        let output = match self.runner.run(&check) {
            Ok(output) => output,
            Err(err) => {
                self.restore(flavor, &template.domain, &available, previous, newly_enabled)?;
                return Err(err.into());
            }
        };
        if !output.success() {
            tracing::error!(%flavor, "configuration rejected, restoring previous descriptor");
            self.restore(flavor, &template.domain, &available, previous, newly_enabled)?;
            return Err(ProvisionError::Render {
                flavor,
                output: output.diagnostics(),
            });
        }

        self.runner
            .run_checked(&HostCommand::new("systemctl").args(["reload", flavor.service_name()]))
            .map_err(|e| ProvisionError::Service {
                unit: flavor.service_name().to_string(),
                reason: format!("{:#}", e),
            })?;

        tracing::info!(%flavor, path = %logical.display(), changed, "virtual host active");
        Ok(VHostReport {
            flavor,
            path: logical,
            outcome: StepOutcome::changed(changed || newly_enabled),
        })
    }

    /// Enable the site; returns whether it was not enabled before.
    fn enable(&self, flavor: ServerFlavor, domain: &str, available: &Path) -> Result<bool> {
        match flavor {
            ServerFlavor::Nginx => {
                let link = self.paths.resolve(flavor.enabled_path(domain));
                if let Ok(target) = std::fs::read_link(&link)
                    && target == available
                {
                    return Ok(false);
                }
                if link.symlink_metadata().is_ok() {
                    std::fs::remove_file(&link).map_err(|e| ProvisionError::io(&link, e))?;
                }
                if let Some(parent) = link.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| ProvisionError::io(parent, e))?;
                }
                std::os::unix::fs::symlink(available, &link)
                    .map_err(|e| ProvisionError::io(&link, e))?;
                Ok(true)
            }
            ServerFlavor::Apache => {
                self.runner.run_checked(
                    &HostCommand::new("a2enmod").args(["proxy", "proxy_http", "headers"]),
                )?;
                let link = self.paths.resolve(flavor.enabled_path(domain));
                if link.symlink_metadata().is_ok() {
                    return Ok(false);
                }
                self.runner
                    .run_checked(&HostCommand::new("a2ensite").arg(format!("{}.conf", domain)))?;
                Ok(true)
            }
        }
    }

    fn restore(
        &self,
        flavor: ServerFlavor,
        domain: &str,
        available: &Path,
        previous: Option<String>,
        newly_enabled: bool,
    ) -> Result<()> {
        if newly_enabled {
            match flavor {
                ServerFlavor::Nginx => {
                    let link = self.paths.resolve(flavor.enabled_path(domain));
                    std::fs::remove_file(&link).map_err(|e| ProvisionError::io(&link, e))?;
                }
                ServerFlavor::Apache => {
                    self.runner.run_checked(
                        &HostCommand::new("a2dissite").arg(format!("{}.conf", domain)),
                    )?;
                }
            }
        }
        match previous {
            Some(content) => host::write_file(available, &content, 0o644),
            None => std::fs::remove_file(available).map_err(|e| ProvisionError::io(available, e)),
        }
    }
}
