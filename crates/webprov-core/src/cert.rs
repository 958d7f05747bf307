//! TLS certificate provisioning through certbot.
//!
//! The only recoverable step: DNS often does not point at a fresh host
//! yet, so a failed request is reported with the command to retry and the
//! run carries on.

use thiserror::Error;

use crate::host::{CommandRunner, HostCommand};
use crate::install::{PackageInstaller, PackageSpec};
use crate::probe::WebServerKind;
use crate::vhost::ServerFlavor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertOutcome {
    Installed,
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("certificate request failed: {reason}")]
pub struct CertError {
    pub reason: String,
    /// Command the operator can run once the cause is fixed
    pub remediation: String,
}

pub struct CertProvisioner<'a> {
    runner: &'a dyn CommandRunner,
    installer: &'a PackageInstaller<'a>,
}

impl<'a> CertProvisioner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, installer: &'a PackageInstaller<'a>) -> Self {
        Self { runner, installer }
    }

    pub fn ensure(
        &self,
        domain: &str,
        aliases: &[String],
        kind: WebServerKind,
        contact_email: &str,
    ) -> Result<CertOutcome, CertError> {
        let Some(flavor) = kind.primary() else {
            return Ok(CertOutcome::Skipped {
                reason: "no web server to bind the certificate to".to_string(),
            });
        };
        if contact_email.is_empty() {
            return Ok(CertOutcome::Skipped {
                reason: "no contact email configured".to_string(),
            });
        }

        let request = certbot_command(flavor, domain, aliases, contact_email);
        let fail = |reason: String| CertError {
            reason,
            remediation: request.to_string(),
        };

        for spec in [
            PackageSpec::new("certbot"),
            PackageSpec::library(flavor.certbot_plugin()),
        ] {
            self.installer
                .ensure(&spec)
                .map_err(|e| fail(e.to_string()))?;
        }

        let output = self
            .runner
            .run(&request)
            .map_err(|e| fail(format!("{:#}", e)))?;
        if !output.success() {
            let err = fail(output.diagnostics());
            tracing::warn!(%domain, error = %err.reason, "certificate not issued");
            return Err(err);
        }

        tracing::info!(%domain, %flavor, "certificate installed");
        Ok(CertOutcome::Installed)
    }
}

/// Non-interactive request for `domain` plus aliases, with HTTP→HTTPS redirect.
pub fn certbot_command(
    flavor: ServerFlavor,
    domain: &str,
    aliases: &[String],
    contact_email: &str,
) -> HostCommand {
    let mut cmd = HostCommand::new("certbot").arg(format!("--{}", flavor.as_str()));
    for name in std::iter::once(domain).chain(aliases.iter().map(String::as_str)) {
        cmd = cmd.args(["-d", name]);
    }
    cmd.args([
        "--non-interactive",
        "--agree-tos",
        "-m",
        contact_email,
        "--redirect",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_covers_domain_and_aliases() {
        let cmd = certbot_command(
            ServerFlavor::Nginx,
            "example.com",
            &["www.example.com".to_string()],
            "admin@example.com",
        );
        assert_eq!(
            cmd.to_string(),
            "certbot --nginx -d example.com -d www.example.com --non-interactive --agree-tos -m admin@example.com --redirect"
        );
    }

    #[test]
    fn apache_uses_apache_plugin() {
        let cmd = certbot_command(ServerFlavor::Apache, "example.com", &[], "a@example.com");
        assert!(cmd.to_string().starts_with("certbot --apache -d example.com --non"));
    }
}
