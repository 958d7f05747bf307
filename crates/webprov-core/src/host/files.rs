//! Whole-file writes for managed artifacts.

use std::path::Path;

use crate::error::{ProvisionError, Result};

/// Read a file if it exists.
pub fn read_existing(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ProvisionError::io(path, err)),
    }
}

/// Write a file, creating parent directories, and apply `mode`.
pub fn write_file(path: &Path, content: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| ProvisionError::io(path, e))?;
    set_mode(path, mode)
}

/// Write `content` only when it differs from what is on disk.
///
/// Returns whether the file changed. The mode is applied either way.
pub fn sync_file(path: &Path, content: &str, mode: u32) -> Result<bool> {
    let unchanged = read_existing(path)?
        .map(|existing| blake3::hash(existing.as_bytes()) == blake3::hash(content.as_bytes()))
        .unwrap_or(false);
    if unchanged {
        set_mode(path, mode)?;
        return Ok(false);
    }
    write_file(path, content, mode)?;
    Ok(true)
}

fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| ProvisionError::io(path, e))
}
