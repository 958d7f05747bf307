//! Package installation with a pinned-binary fallback.
//!
//! A package is considered present when its executable resolves on the
//! search path (or, for packages without one, when dpkg reports it
//! installed). Otherwise apt installs it; if apt fails and the [`PackageSpec`] carries
//! a [`FallbackArtifact`], the release archive is downloaded instead.

mod artifact;

use std::cell::Cell;
use std::path::PathBuf;

pub use artifact::{ArchiveKind, FallbackArtifact, extract_binary};

use crate::config::SiteConfig;
use crate::error::{ProvisionError, Result};
use crate::host::{CommandRunner, HostCommand, HostPaths, layout};
use crate::types::StepOutcome;

/// What to ensure is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub package: String,
    /// Executable proving the package is present
    pub binary: Option<String>,
    pub fallback: Option<FallbackArtifact>,
}

impl PackageSpec {
    /// A package whose executable has the same name.
    pub fn new(package: impl Into<String>) -> Self {
        let package = package.into();
        Self {
            binary: Some(package.clone()),
            package,
            fallback: None,
        }
    }

    /// A package without an executable of its own (e.g. a plugin).
    pub fn library(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            binary: None,
            fallback: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    pub fn with_fallback(mut self, artifact: FallbackArtifact) -> Self {
        self.fallback = Some(artifact);
        self
    }

    /// Tools the site needs: git, the JavaScript runtime and the webhook daemon.
    pub fn site_requirements(site: &SiteConfig) -> Vec<PackageSpec> {
        vec![
            PackageSpec::new("git"),
            PackageSpec::new("nodejs").with_binary("node"),
            PackageSpec::new("webhook").with_fallback(site.webhook_artifact().clone()),
        ]
    }
}

/// Installs packages through apt, falling back to pinned downloads.
pub struct PackageInstaller<'a> {
    runner: &'a dyn CommandRunner,
    paths: &'a HostPaths,
    index_refreshed: Cell<bool>,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, paths: &'a HostPaths) -> Self {
        Self {
            runner,
            paths,
            index_refreshed: Cell::new(false),
        }
    }

    /// Ensure the package is present.
    pub fn ensure(&self, spec: &PackageSpec) -> Result<StepOutcome> {
        if self.is_present(spec) {
            tracing::debug!(package = %spec.package, "already installed");
            return Ok(StepOutcome::Unchanged);
        }

        let primary = match self.apt_install(&spec.package) {
            Ok(()) => {
                tracing::info!(package = %spec.package, "installed");
                return Ok(StepOutcome::Changed);
            }
            Err(err) => err,
        };

        let Some(artifact) = &spec.fallback else {
            return Err(ProvisionError::Install {
                package: spec.package.clone(),
                reason: format!("{:#}", primary),
            });
        };

        tracing::warn!(
            package = %spec.package,
            error = %primary,
            url = %artifact.url(),
            "package manager failed, downloading pinned release"
        );
        match artifact.install_into(&self.paths.resolve(layout::BIN_DIR)) {
            Ok(path) => {
                tracing::info!(package = %spec.package, path = %path.display(), "installed from release archive");
                Ok(StepOutcome::Changed)
            }
            Err(fallback) => Err(ProvisionError::Install {
                package: spec.package.clone(),
                reason: format!(
                    "package manager: {:#}; release download: {:#}",
                    primary, fallback
                ),
            }),
        }
    }

    /// Ensure each package in order, stopping at the first failure.
    pub fn ensure_all(&self, specs: &[PackageSpec]) -> Result<Vec<(String, StepOutcome)>> {
        specs
            .iter()
            .map(|spec| Ok((spec.package.clone(), self.ensure(spec)?)))
            .collect()
    }

    /// Path of an installed executable, if any.
    pub fn locate(&self, binary: &str) -> Option<PathBuf> {
        self.runner.find_executable(binary)
    }

    fn is_present(&self, spec: &PackageSpec) -> bool {
        match &spec.binary {
            Some(binary) => self.runner.find_executable(binary).is_some(),
            None => self.dpkg_installed(&spec.package),
        }
    }

    fn dpkg_installed(&self, package: &str) -> bool {
        let cmd = HostCommand::new("dpkg-query").args(["-W", "-f=${Status}", package]);
        match self.runner.run(&cmd) {
            Ok(output) => output.success() && output.stdout.contains("install ok installed"),
            Err(err) => {
                tracing::debug!(package, error = %err, "dpkg-query unavailable");
                false
            }
        }
    }

    fn apt_install(&self, package: &str) -> anyhow::Result<()> {
        if !self.index_refreshed.get() {
            self.runner.run_checked(&apt(["update"]))?;
            self.index_refreshed.set(true);
        }
        self.runner.run_checked(&apt(["install", "-y", package]))?;
        Ok(())
    }
}

fn apt<const N: usize>(args: [&str; N]) -> HostCommand {
    HostCommand::new("apt-get")
        .args(args)
        .env("DEBIAN_FRONTEND", "noninteractive")
}
