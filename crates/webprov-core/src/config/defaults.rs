//! Compiled-in deployment target.

pub const DOMAIN: &str = "example.com";
pub const REPOSITORY: &str = "https://github.com/example/site.git";
pub const BRANCH: &str = "main";
pub const WEBHOOK_PORT: u16 = 9000;
pub const SERVICE_USER: &str = "www-data";
pub const SERVICE_GROUP: &str = "www-data";

/// Pinned release of the webhook daemon used when the package is unavailable.
pub const WEBHOOK_VERSION: &str = "2.8.1";
pub const WEBHOOK_URL_TEMPLATE: &str =
    "https://github.com/adnanh/webhook/releases/download/{version}/webhook-linux-amd64.tar.gz";

pub const CONFIG_FILE_NAME: &str = "webprov.toml";

pub fn webroot(domain: &str) -> String {
    format!("/var/www/{}", domain)
}

pub fn contact_email(domain: &str) -> String {
    format!("admin@{}", domain)
}
