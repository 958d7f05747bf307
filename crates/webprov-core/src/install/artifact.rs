//! Pinned binary artifacts: download and extraction.
//!
//! Used when the package manager cannot provide a tool. The archive is
//! fetched over HTTPS and only the named executable is extracted, straight
//! into the executable directory.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::defaults;

/// A pinned-version release archive that contains one executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackArtifact {
    /// Executable name inside the archive
    pub binary: String,
    pub version: semver::Version,
    /// Download URL with a `{version}` placeholder
    pub url_template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url
            .split('?')
            .next()
            .and_then(|s| s.split('#').next())
            .unwrap_or(url);
        if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if path.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

impl FallbackArtifact {
    pub fn new(
        binary: impl Into<String>,
        version: semver::Version,
        url_template: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            version,
            url_template: url_template.into(),
        }
    }

    /// The webhook daemon release pinned in the defaults.
    pub fn webhook_default() -> Self {
        let version = semver::Version::parse(defaults::WEBHOOK_VERSION)
            .unwrap_or_else(|_| semver::Version::new(2, 8, 1));
        Self::webhook(version)
    }

    pub fn webhook(version: semver::Version) -> Self {
        Self::new("webhook", version, defaults::WEBHOOK_URL_TEMPLATE)
    }

    pub fn url(&self) -> String {
        self.url_template
            .replace("{version}", &self.version.to_string())
    }

    /// Download the archive and place the executable in `bin_dir`.
    pub fn install_into(&self, bin_dir: &Path) -> anyhow::Result<PathBuf> {
        let url = self.url();
        let kind = ArchiveKind::from_url(&url)
            .ok_or_else(|| anyhow::anyhow!("Unsupported archive format: {}", url))?;

        // Block on the async download using a tokio runtime
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
        let data = runtime.block_on(download(&url))?;

        extract_binary(&data, kind, &self.binary, bin_dir)
    }
}

async fn download(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to download: HTTP {} from {}", response.status(), url);
    }

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))?;

    Ok(bytes.to_vec())
}

/// Extract the entry named `binary` (at any depth) into `dest_dir` as an
/// executable file.
pub fn extract_binary(
    data: &[u8],
    kind: ArchiveKind,
    binary: &str,
    dest_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let contents = match kind {
        ArchiveKind::TarGz => read_from_tar_gz(data, binary)?,
        ArchiveKind::Zip => read_from_zip(data, binary)?,
    };
    let contents =
        contents.ok_or_else(|| anyhow::anyhow!("Archive does not contain '{}'", binary))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;
    let target = dest_dir.join(binary);
    std::fs::write(&target, contents)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to mark {} executable", target.display()))?;

    Ok(target)
}

fn read_from_tar_gz(data: &[u8], binary: &str) -> anyhow::Result<Option<Vec<u8>>> {
    let decoder = flate2::read::GzDecoder::new(data);
    let mut archive = tar::Archive::new(decoder);
    let entries = archive.entries().context("Failed to read tar archive")?;
    for entry in entries {
        let mut entry = entry.context("Failed to read tar entry")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let is_binary = {
            let path = entry.path().context("Invalid tar entry path")?;
            path.file_name().and_then(|n| n.to_str()) == Some(binary)
        };
        if !is_binary {
            continue;
        }
        let mut buffer = Vec::new();
        entry
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read '{}' from archive", binary))?;
        return Ok(Some(buffer));
    }
    Ok(None)
}

fn read_from_zip(data: &[u8], binary: &str) -> anyhow::Result<Option<Vec<u8>>> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor).context("Failed to read zip archive")?;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("Failed to read zip entry {}", i))?;
        if file.is_dir() {
            continue;
        }
        let matches = file
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n == std::ffi::OsStr::new(binary)))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read zip entry: {}", file.name()))?;
        return Ok(Some(buffer));
    }
    Ok(None)
}
