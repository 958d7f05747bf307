use std::path::{Component, Path};

use super::ConfigError;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Check that `domain` is a fully qualified DNS name suitable as the
/// primary server name. The `www` alias is derived, so it must not be given.
pub fn validate_domain(domain: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidDomain {
        domain: domain.to_string(),
        reason: reason.to_string(),
    };

    if domain.is_empty() {
        return Err(invalid("empty"));
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(invalid("longer than 253 characters"));
    }
    if domain.starts_with("www.") {
        return Err(invalid("give the bare domain; the www alias is added automatically"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid("needs at least two labels"));
    }
    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(invalid("each label must be 1-63 characters"));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid("only lowercase letters, digits and '-' are allowed"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("labels cannot start or end with '-'"));
        }
    }
    Ok(())
}

pub(super) fn validate_repo_url(repo: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRepoUrl {
        url: repo.to_string(),
        reason,
    };

    // scp-like syntax: git@github.com:org/site.git
    if let Some((user_host, path)) = repo.split_once(':')
        && user_host.contains('@')
        && !user_host.contains('/')
    {
        if path.is_empty() {
            return Err(invalid("missing repository path".to_string()));
        }
        return Ok(());
    }

    let url = url::Url::parse(repo).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "https" | "http" | "ssh" | "git" | "file" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

/// Branch names are substituted into the deploy script, so they are held to
/// a conservative subset of git ref syntax.
pub(super) fn validate_branch(branch: &str) -> Result<(), ConfigError> {
    let bad = branch.is_empty()
        || branch.starts_with('-')
        || branch.starts_with('/')
        || branch.ends_with('/')
        || branch.ends_with(".lock")
        || branch.contains("..")
        || branch.contains("//")
        || !branch.chars().all(is_path_char);
    if bad {
        return Err(ConfigError::InvalidBranch(branch.to_string()));
    }
    Ok(())
}

/// The webroot appears unquoted in server descriptors and the deploy script.
pub(super) fn validate_webroot(webroot: &Path) -> Result<(), ConfigError> {
    if !webroot.is_absolute() {
        return Err(ConfigError::RelativeWebroot(webroot.to_path_buf()));
    }
    let safe = webroot.to_str().is_some_and(|path| {
        path.chars().all(is_path_char)
            && !webroot
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
    });
    if !safe {
        return Err(ConfigError::UnsafeWebroot(webroot.to_path_buf()));
    }
    Ok(())
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-')
}

pub(super) fn validate_port(port: u16) -> Result<(), ConfigError> {
    if port < 1024 {
        return Err(ConfigError::PortOutOfRange(port));
    }
    Ok(())
}

pub(super) fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Ok(());
    }
    match email.split_once('@') {
        Some((local, host)) if !local.is_empty() && host.contains('.') => Ok(()),
        _ => Err(ConfigError::InvalidEmail(email.to_string())),
    }
}

pub(super) fn validate_account(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ConfigError::InvalidAccount(name.to_string()));
    }
    Ok(())
}
