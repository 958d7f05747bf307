//! Fixed system locations, as seen by the host's services.
//!
//! These are logical paths; writes go through [`super::HostPaths::resolve`].

use std::path::PathBuf;

pub const NGINX_SITES_AVAILABLE: &str = "/etc/nginx/sites-available";
pub const NGINX_SITES_ENABLED: &str = "/etc/nginx/sites-enabled";
pub const APACHE_SITES_AVAILABLE: &str = "/etc/apache2/sites-available";
pub const APACHE_SITES_ENABLED: &str = "/etc/apache2/sites-enabled";
pub const HOOKS_DIR: &str = "/etc/webhook";
pub const SYSTEMD_DIR: &str = "/etc/systemd/system";
pub const BIN_DIR: &str = "/usr/local/bin";
pub const LOG_DIR: &str = "/var/log/webprov";

/// Unit name of the webhook listener.
pub const WEBHOOK_UNIT: &str = "webhook";

pub fn hooks_file() -> PathBuf {
    PathBuf::from(HOOKS_DIR).join("hooks.json")
}

pub fn webhook_unit_file() -> PathBuf {
    PathBuf::from(SYSTEMD_DIR).join(format!("{}.service", WEBHOOK_UNIT))
}

pub fn deploy_script(domain: &str) -> PathBuf {
    PathBuf::from(BIN_DIR).join(format!("deploy-{}.sh", domain))
}

pub fn deploy_log(domain: &str) -> PathBuf {
    PathBuf::from(LOG_DIR).join(format!("deploy-{}.log", domain))
}
