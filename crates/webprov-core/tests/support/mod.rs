#![allow(dead_code)]

pub mod git;
pub mod host;

pub use host::FakeHost;

use std::path::Path;

use webprov_core::config::SiteConfig;
use webprov_core::host::HostPaths;

/// Default site pointed at a local upstream repository.
pub fn site_for(upstream: &Path) -> SiteConfig {
    SiteConfig::builder("example.com")
        .with_repo_url(git::file_url(upstream))
        .build()
        .unwrap()
}

pub fn read(paths: &HostPaths, logical: impl AsRef<Path>) -> String {
    std::fs::read_to_string(paths.resolve(logical)).unwrap()
}
