//! Optional `webprov.toml` overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::install::FallbackArtifact;

use super::{ConfigError, SiteConfig, defaults};

/// Fields that may override the compiled-in deployment target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub domain: Option<String>,
    pub webroot: Option<PathBuf>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub webhook_port: Option<u16>,
    pub contact_email: Option<String>,
    pub service_user: Option<String>,
    pub service_group: Option<String>,
    pub webhook_version: Option<semver::Version>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Default location: `<config dir>/webprov/webprov.toml`, if it exists.
    pub fn discover() -> Option<PathBuf> {
        let path = dirs::config_dir()?
            .join("webprov")
            .join(defaults::CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    /// Apply the overrides on top of the defaults and validate the result.
    pub fn into_site_config(self) -> Result<SiteConfig, ConfigError> {
        let domain = self.domain.unwrap_or_else(|| defaults::DOMAIN.to_string());
        let mut builder = SiteConfig::builder(domain);
        if let Some(webroot) = self.webroot {
            builder = builder.with_webroot(webroot);
        }
        if let Some(repo) = self.repository {
            builder = builder.with_repo_url(repo);
        }
        if let Some(branch) = self.branch {
            builder = builder.with_branch(branch);
        }
        if let Some(port) = self.webhook_port {
            builder = builder.with_webhook_port(port);
        }
        if let Some(email) = self.contact_email {
            builder = builder.with_contact_email(email);
        }
        if self.service_user.is_some() || self.service_group.is_some() {
            let user = self
                .service_user
                .unwrap_or_else(|| defaults::SERVICE_USER.to_string());
            let group = self.service_group.unwrap_or_else(|| user.clone());
            builder = builder.with_service_account(user, group);
        }
        if let Some(version) = self.webhook_version {
            builder = builder.with_webhook_artifact(FallbackArtifact::webhook(version));
        }
        builder.build()
    }
}
