//! Site configuration.
//!
//! A [`SiteConfig`] is built once from compiled-in defaults and an optional
//! `webprov.toml`, validated, and then threaded read-only through every
//! provisioning step.

pub mod defaults;
mod file;
mod site;
mod validate;

pub use file::ConfigFile;
pub use site::{SiteConfig, SiteConfigBuilder};
pub use validate::validate_domain;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    #[error("webroot must be an absolute path: {}", .0.display())]
    RelativeWebroot(PathBuf),

    #[error("webroot {} may only contain letters, digits and '._/-'", .0.display())]
    UnsafeWebroot(PathBuf),

    #[error("invalid repository URL '{url}': {reason}")]
    InvalidRepoUrl { url: String, reason: String },

    #[error("invalid branch name '{0}'")]
    InvalidBranch(String),

    #[error("webhook port {0} is outside 1024-65535")]
    PortOutOfRange(u16),

    #[error("invalid contact email '{0}'")]
    InvalidEmail(String),

    #[error("invalid service account '{0}'")]
    InvalidAccount(String),

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}
