use std::path::{Path, PathBuf};

use crate::config::SiteConfig;

use super::{ServerFlavor, apache, nginx};

/// Path on the site that the web server forwards to the webhook daemon.
pub const WEBHOOK_LOCATION: &str = "/webhook-deploy";
/// Hook id served by the daemon behind [`WEBHOOK_LOCATION`].
pub const WEBHOOK_HOOK_ID: &str = "deploy";

/// Typed inputs for a virtual host; every field has been validated by
/// [`SiteConfig`] before it reaches a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VHostTemplate {
    pub domain: String,
    pub aliases: Vec<String>,
    pub webroot: PathBuf,
    pub webhook_port: u16,
}

impl VHostTemplate {
    pub fn new(site: &SiteConfig, webhook_port: u16) -> Self {
        Self {
            domain: site.domain().to_string(),
            aliases: vec![site.www_alias()],
            webroot: site.webroot().to_path_buf(),
            webhook_port,
        }
    }

    pub fn server_names(&self) -> Vec<&str> {
        std::iter::once(self.domain.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect()
    }

    pub fn webroot(&self) -> &Path {
        &self.webroot
    }

    /// Local URL the proxy location forwards to.
    pub fn webhook_upstream(&self) -> String {
        format!(
            "http://127.0.0.1:{}/hooks/{}",
            self.webhook_port, WEBHOOK_HOOK_ID
        )
    }

    pub fn render(&self, flavor: ServerFlavor) -> String {
        match flavor {
            ServerFlavor::Nginx => nginx::render(self),
            ServerFlavor::Apache => apache::render(self),
        }
    }
}
