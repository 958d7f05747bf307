//! Host service detection.
//!
//! Detection has one side effect: when no web server is active, nginx is
//! installed and started, so the snapshot always names at least one server.

use serde::Serialize;

use crate::error::{ProvisionError, Result};
use crate::host::{CommandRunner, HostCommand};
use crate::install::{PackageInstaller, PackageSpec};
use crate::types::StepOutcome;
use crate::vhost::ServerFlavor;

/// Which web servers are active on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebServerKind {
    None,
    Nginx,
    Apache,
    Both,
}

impl WebServerKind {
    pub fn from_active(nginx: bool, apache: bool) -> Self {
        match (nginx, apache) {
            (true, true) => Self::Both,
            (true, false) => Self::Nginx,
            (false, true) => Self::Apache,
            (false, false) => Self::None,
        }
    }

    /// Servers to configure, nginx first.
    pub fn servers(self) -> Vec<ServerFlavor> {
        match self {
            Self::None => Vec::new(),
            Self::Nginx => vec![ServerFlavor::Nginx],
            Self::Apache => vec![ServerFlavor::Apache],
            Self::Both => vec![ServerFlavor::Nginx, ServerFlavor::Apache],
        }
    }

    /// The server that owns the certificate binding.
    pub fn primary(self) -> Option<ServerFlavor> {
        self.servers().into_iter().next()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nginx => "nginx",
            Self::Apache => "apache",
            Self::Both => "nginx + apache",
        }
    }
}

/// Snapshot of what the host already provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostCapabilities {
    pub web_server: WebServerKind,
    pub has_git: bool,
    pub has_runtime: bool,
    pub has_webhook_daemon: bool,
    pub has_cert_tool: bool,
}

/// Capabilities plus whether the probe had to install the default server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub capabilities: HostCapabilities,
    pub outcome: StepOutcome,
}

pub struct ServiceProbe<'a> {
    runner: &'a dyn CommandRunner,
    installer: &'a PackageInstaller<'a>,
}

impl<'a> ServiceProbe<'a> {
    pub fn new(runner: &'a dyn CommandRunner, installer: &'a PackageInstaller<'a>) -> Self {
        Self { runner, installer }
    }

    pub fn detect(&self) -> Result<Detection> {
        let nginx = self.is_active(ServerFlavor::Nginx.service_name());
        let apache = self.is_active(ServerFlavor::Apache.service_name());

        let mut web_server = WebServerKind::from_active(nginx, apache);
        let mut outcome = StepOutcome::Unchanged;
        if web_server == WebServerKind::None {
            tracing::info!("no active web server, installing nginx");
            self.start_default()?;
            web_server = WebServerKind::Nginx;
            outcome = StepOutcome::Changed;
        }

        let capabilities = HostCapabilities {
            web_server,
            has_git: self.has("git"),
            has_runtime: self.has("node"),
            has_webhook_daemon: self.has("webhook"),
            has_cert_tool: self.has("certbot"),
        };
        tracing::info!(web_server = web_server.as_str(), ?capabilities, "host probed");
        Ok(Detection {
            capabilities,
            outcome,
        })
    }

    /// Whether a systemd unit is active. An unusable service manager counts
    /// as inactive, which leads to installing the default server.
    pub fn is_active(&self, unit: &str) -> bool {
        let cmd = HostCommand::new("systemctl").args(["is-active", "--quiet", unit]);
        match self.runner.run(&cmd) {
            Ok(output) => output.success(),
            Err(err) => {
                tracing::debug!(unit, error = %err, "could not query service state");
                false
            }
        }
    }

    fn has(&self, binary: &str) -> bool {
        self.runner.find_executable(binary).is_some()
    }

    fn start_default(&self) -> Result<()> {
        let flavor = ServerFlavor::Nginx;
        self.installer.ensure(&PackageSpec::new(flavor.package()))?;
        let start = HostCommand::new("systemctl").args(["enable", "--now", flavor.service_name()]);
        let output = self.runner.run(&start)?;
        if !output.success() {
            return Err(ProvisionError::Detection {
                reason: format!("could not start {}: {}", flavor, output.diagnostics()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_active_flags() {
        assert_eq!(WebServerKind::from_active(false, false), WebServerKind::None);
        assert_eq!(WebServerKind::from_active(true, false), WebServerKind::Nginx);
        assert_eq!(WebServerKind::from_active(false, true), WebServerKind::Apache);
        assert_eq!(WebServerKind::from_active(true, true), WebServerKind::Both);
    }

    #[test]
    fn both_configures_nginx_first() {
        assert_eq!(
            WebServerKind::Both.servers(),
            vec![ServerFlavor::Nginx, ServerFlavor::Apache]
        );
        assert_eq!(WebServerKind::Both.primary(), Some(ServerFlavor::Nginx));
        assert_eq!(WebServerKind::None.primary(), None);
    }
}
