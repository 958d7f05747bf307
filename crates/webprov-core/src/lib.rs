//! Webprov Core Library
//!
//! Provisions a single web host for a single site: detects or installs a
//! web server, syncs the site repository into the webroot, renders the
//! virtual host, installs a push-to-deploy webhook and requests a TLS
//! certificate. Every step is idempotent so the whole run can be repeated.

pub mod cert;
pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod install;
pub mod pipeline;
pub mod probe;
pub mod repo;
pub mod types;
pub mod vhost;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigError, ConfigFile, SiteConfig, SiteConfigBuilder};

    // Errors
    pub use crate::error::ProvisionError;

    // Host access
    pub use crate::host::{CommandOutput, CommandRunner, HostCommand, HostPaths, SystemRunner};

    // Steps
    pub use crate::cert::{CertError, CertOutcome, CertProvisioner};
    pub use crate::hooks::{DeployHookInstaller, DeploySecret, HookDefinition, HookSet, TriggerRule};
    pub use crate::install::{FallbackArtifact, PackageInstaller, PackageSpec};
    pub use crate::probe::{Detection, HostCapabilities, ServiceProbe, WebServerKind};
    pub use crate::repo::{RepoSync, SyncOutcome, SyncState};
    pub use crate::vhost::{ServerFlavor, VHostRenderer, VHostTemplate};

    // Orchestration
    pub use crate::pipeline::{ProvisionReport, Provisioner, Redeployer, StepReport};
    pub use crate::types::StepOutcome;
}
