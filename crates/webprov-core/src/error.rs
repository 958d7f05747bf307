//! Error taxonomy for provisioning steps.
//!
//! Components use `anyhow` internally and convert to [`ProvisionError`] at
//! their boundary, so the orchestrator can tell which step failed and what
//! the operator should run by hand.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::vhost::ServerFlavor;

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("web server detection failed: {reason}")]
    Detection { reason: String },

    #[error("failed to install '{package}': {reason}")]
    Install { package: String, reason: String },

    #[error("failed to sync repository at {}: {reason}", path.display())]
    Sync { path: PathBuf, reason: String },

    #[error("{flavor} rejected the rendered configuration; previous configuration kept:\n{output}")]
    Render { flavor: ServerFlavor, output: String },

    #[error("service '{unit}' could not be started: {reason}")]
    Service { unit: String, reason: String },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] anyhow::Error),
}

impl ProvisionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sync(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Sync {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Manual command that completes the failed step, when one exists.
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::Detection { .. } => Some("systemctl enable --now nginx".to_string()),
            Self::Install { package, .. } => Some(format!("apt-get install -y {package}")),
            Self::Sync { path, .. } => Some(format!("git -C {} status", path.display())),
            Self::Render { flavor, .. } => Some(flavor.validate_command().to_string()),
            Self::Service { unit, .. } => Some(format!("journalctl -u {unit} --no-pager")),
            Self::Config(_) | Self::Io { .. } | Self::Command(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_error_suggests_package_manager() {
        let err = ProvisionError::Install {
            package: "webhook".to_string(),
            reason: "unavailable".to_string(),
        };
        assert_eq!(
            err.remediation().as_deref(),
            Some("apt-get install -y webhook")
        );
        assert!(err.to_string().contains("'webhook'"));
    }

    #[test]
    fn render_error_suggests_validator() {
        let err = ProvisionError::Render {
            flavor: ServerFlavor::Nginx,
            output: "unexpected }".to_string(),
        };
        assert_eq!(err.remediation().as_deref(), Some("nginx -t"));
        assert!(err.to_string().contains("previous configuration kept"));
    }

    #[test]
    fn command_errors_have_no_remediation() {
        let err = ProvisionError::from(anyhow::anyhow!("boom"));
        assert!(err.remediation().is_none());
    }
}
