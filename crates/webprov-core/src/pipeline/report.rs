//! Run report and the operator-facing summary.

use std::fmt;

use crate::cert::{CertError, CertOutcome};
use crate::hooks::DeploySecret;
use crate::probe::HostCapabilities;
use crate::types::StepOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
    pub detail: String,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub domain: String,
    pub aliases: Vec<String>,
    pub webhook_url: String,
    pub capabilities: HostCapabilities,
    pub steps: Vec<StepReport>,
    pub secret: DeploySecret,
    pub certificate: Result<CertOutcome, CertError>,
}

impl ProvisionReport {
    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|step| step.name == name)
    }

    /// Manual follow-ups, in the order the operator should do them.
    pub fn next_steps(&self) -> Vec<String> {
        let mut steps = vec![
            format!(
                "Add a webhook in the repository settings: payload URL {}, content type application/json, secret shown above.",
                self.webhook_url
            ),
            format!(
                "Point DNS A records for {} at this server.",
                std::iter::once(self.domain.as_str())
                    .chain(self.aliases.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" and ")
            ),
        ];
        if let Err(err) = &self.certificate {
            steps.push(format!(
                "Once DNS resolves, request the certificate: {}",
                err.remediation
            ));
        }
        steps
    }

    /// Human-readable summary. Contains the secret: print it once, never log it.
    pub fn render_summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Provisioned {}", self.domain)?;
        writeln!(f)?;
        for step in &self.steps {
            writeln!(
                f,
                "  {} {}: {}",
                step.outcome.marker(),
                step.name,
                step.detail
            )?;
        }
        match &self.certificate {
            Ok(CertOutcome::Installed) => {
                writeln!(f, "  ✓ Certificate: installed, HTTP redirects to HTTPS")?
            }
            Ok(CertOutcome::Skipped { reason }) => {
                writeln!(f, "  ⚠ Certificate: skipped ({})", reason)?
            }
            Err(err) => writeln!(f, "  ⚠ Certificate: {}", err)?,
        }

        writeln!(f)?;
        writeln!(f, "Webhook")?;
        writeln!(f, "  URL:    {}", self.webhook_url)?;
        writeln!(f, "  Secret: {}", self.secret.expose())?;
        writeln!(f, "  The secret is shown only once; copy it now.")?;

        writeln!(f)?;
        writeln!(f, "Next steps")?;
        for (i, step) in self.next_steps().iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, step)?;
        }
        Ok(())
    }
}
