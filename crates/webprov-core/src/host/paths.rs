use std::path::{Path, PathBuf};

/// Maps logical system paths onto the filesystem root being provisioned.
///
/// Production uses `/`; tests point the root at a temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    root: PathBuf,
}

impl HostPaths {
    pub fn system() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical absolute path below the root.
    pub fn resolve(&self, logical: impl AsRef<Path>) -> PathBuf {
        let logical = logical.as_ref();
        let relative = logical.strip_prefix("/").unwrap_or(logical);
        self.root.join(relative)
    }
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::system()
    }
}
