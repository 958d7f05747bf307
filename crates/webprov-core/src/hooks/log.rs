use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::error::{ProvisionError, Result};

/// Append-only record of deploys, one timestamped line each.
#[derive(Debug, Clone)]
pub struct DeployLog {
    path: PathBuf,
}

impl DeployLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ProvisionError::io(&self.path, e))?;
        let line = format!(
            "{} {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message
        );
        file.write_all(line.as_bytes())
            .map_err(|e| ProvisionError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_adds_timestamped_lines() {
        let temp = TempDir::new().unwrap();
        let log = DeployLog::new(temp.path().join("log").join("deploy.log"));

        log.append("deployed main abc1234").unwrap();
        log.append("deployed main def5678").unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" deployed main abc1234"));
        let stamp = lines[1].split_whitespace().next().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }
}
