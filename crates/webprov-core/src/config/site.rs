use std::path::{Path, PathBuf};

use crate::install::FallbackArtifact;
use crate::vhost::WEBHOOK_LOCATION;

use super::{ConfigError, defaults, validate};

/// Immutable description of the site being provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    domain: String,
    webroot: PathBuf,
    repo_url: String,
    branch: String,
    webhook_port: u16,
    contact_email: String,
    service_user: String,
    service_group: String,
    webhook_artifact: FallbackArtifact,
}

impl SiteConfig {
    /// Start from the defaults for `domain`.
    pub fn builder(domain: impl Into<String>) -> SiteConfigBuilder {
        SiteConfigBuilder::new(domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Names the site answers to: the domain and its `www` alias.
    pub fn server_names(&self) -> Vec<String> {
        vec![self.domain.clone(), self.www_alias()]
    }

    pub fn www_alias(&self) -> String {
        format!("www.{}", self.domain)
    }

    pub fn webroot(&self) -> &Path {
        &self.webroot
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn webhook_port(&self) -> u16 {
        self.webhook_port
    }

    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    pub fn service_user(&self) -> &str {
        &self.service_user
    }

    pub fn service_group(&self) -> &str {
        &self.service_group
    }

    /// `user:group` as accepted by chown.
    pub fn owner_spec(&self) -> String {
        format!("{}:{}", self.service_user, self.service_group)
    }

    pub fn webhook_artifact(&self) -> &FallbackArtifact {
        &self.webhook_artifact
    }

    /// Public URL the source-control host posts to.
    pub fn webhook_url(&self) -> String {
        format!("http://{}{}", self.domain, WEBHOOK_LOCATION)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        // The compiled-in defaults are valid by construction.
        Self::builder(defaults::DOMAIN).assemble()
    }
}

/// Builder for [`SiteConfig`]; validation happens in [`SiteConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct SiteConfigBuilder {
    domain: String,
    webroot: Option<PathBuf>,
    repo_url: String,
    branch: String,
    webhook_port: u16,
    contact_email: Option<String>,
    service_user: String,
    service_group: String,
    webhook_artifact: FallbackArtifact,
}

impl SiteConfigBuilder {
    fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            webroot: None,
            repo_url: defaults::REPOSITORY.to_string(),
            branch: defaults::BRANCH.to_string(),
            webhook_port: defaults::WEBHOOK_PORT,
            contact_email: None,
            service_user: defaults::SERVICE_USER.to_string(),
            service_group: defaults::SERVICE_GROUP.to_string(),
            webhook_artifact: FallbackArtifact::webhook_default(),
        }
    }

    pub fn with_webroot(mut self, webroot: impl Into<PathBuf>) -> Self {
        self.webroot = Some(webroot.into());
        self
    }

    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = url.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_webhook_port(mut self, port: u16) -> Self {
        self.webhook_port = port;
        self
    }

    /// An empty email skips certificate provisioning.
    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    pub fn with_service_account(
        mut self,
        user: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        self.service_user = user.into();
        self.service_group = group.into();
        self
    }

    pub fn with_webhook_artifact(mut self, artifact: FallbackArtifact) -> Self {
        self.webhook_artifact = artifact;
        self
    }

    pub fn build(self) -> Result<SiteConfig, ConfigError> {
        let config = self.assemble();
        validate::validate_domain(&config.domain)?;
        validate::validate_webroot(&config.webroot)?;
        validate::validate_repo_url(&config.repo_url)?;
        validate::validate_branch(&config.branch)?;
        validate::validate_port(config.webhook_port)?;
        validate::validate_email(&config.contact_email)?;
        validate::validate_account(&config.service_user)?;
        validate::validate_account(&config.service_group)?;
        Ok(config)
    }

    fn assemble(self) -> SiteConfig {
        let webroot = self
            .webroot
            .unwrap_or_else(|| PathBuf::from(defaults::webroot(&self.domain)));
        let contact_email = self
            .contact_email
            .unwrap_or_else(|| defaults::contact_email(&self.domain));
        SiteConfig {
            domain: self.domain,
            webroot,
            repo_url: self.repo_url,
            branch: self.branch,
            webhook_port: self.webhook_port,
            contact_email,
            service_user: self.service_user,
            service_group: self.service_group,
            webhook_artifact: self.webhook_artifact,
        }
    }
}
