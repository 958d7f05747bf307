mod support;

use tempfile::TempDir;
use webprov_core::error::ProvisionError;
use webprov_core::host::HostPaths;
use webprov_core::install::{FallbackArtifact, PackageInstaller, PackageSpec};
use webprov_core::types::StepOutcome;

use support::FakeHost;

fn unreachable_artifact(template: &str) -> FallbackArtifact {
    FallbackArtifact::new("webhook", semver::Version::new(2, 8, 1), template)
}

#[test]
fn present_executable_needs_no_package_manager() {
    let temp = TempDir::new().unwrap();
    let paths = HostPaths::with_root(temp.path());
    let host = FakeHost::new().with_executable("git");

    let outcome = PackageInstaller::new(&host, &paths)
        .ensure(&PackageSpec::new("git"))
        .unwrap();

    assert_eq!(outcome, StepOutcome::Unchanged);
    assert!(host.calls().is_empty());
}

#[test]
fn missing_packages_install_with_a_single_index_refresh() {
    let temp = TempDir::new().unwrap();
    let paths = HostPaths::with_root(temp.path());
    let host = FakeHost::new();
    let installer = PackageInstaller::new(&host, &paths);

    let results = installer
        .ensure_all(&[
            PackageSpec::new("git"),
            PackageSpec::new("nodejs").with_binary("node"),
        ])
        .unwrap();

    assert_eq!(
        results,
        vec![
            ("git".to_string(), StepOutcome::Changed),
            ("nodejs".to_string(), StepOutcome::Changed),
        ]
    );
    assert_eq!(host.count("apt-get update"), 1);
    assert_eq!(
        host.calls(),
        vec![
            "apt-get update".to_string(),
            "apt-get install -y git".to_string(),
            "apt-get install -y nodejs".to_string(),
        ]
    );
    assert!(installer.locate("node").is_some());

    host.clear_calls();
    assert_eq!(
        installer.ensure(&PackageSpec::new("git")).unwrap(),
        StepOutcome::Unchanged
    );
    assert!(host.calls().is_empty());
}

#[test]
fn library_packages_are_checked_with_dpkg() {
    let temp = TempDir::new().unwrap();
    let paths = HostPaths::with_root(temp.path());
    let host = FakeHost::new();
    let installer = PackageInstaller::new(&host, &paths);
    let spec = PackageSpec::library("python3-certbot-nginx");

    assert_eq!(installer.ensure(&spec).unwrap(), StepOutcome::Changed);
    assert_eq!(installer.ensure(&spec).unwrap(), StepOutcome::Unchanged);
    assert_eq!(host.count("dpkg-query"), 2);
    assert_eq!(host.count("apt-get install"), 1);
}

#[test]
fn package_manager_failure_without_fallback_is_fatal() {
    let temp = TempDir::new().unwrap();
    let paths = HostPaths::with_root(temp.path());
    let host = FakeHost::new().with_unavailable_package("nodejs");

    let err = PackageInstaller::new(&host, &paths)
        .ensure(&PackageSpec::new("nodejs").with_binary("node"))
        .unwrap_err();

    match &err {
        ProvisionError::Install { package, reason } => {
            assert_eq!(package, "nodejs");
            assert!(reason.contains("Unable to locate package"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.remediation().as_deref(),
        Some("apt-get install -y nodejs")
    );
}

#[test]
fn failed_fallback_reports_both_causes() {
    let temp = TempDir::new().unwrap();
    let paths = HostPaths::with_root(temp.path());
    let host = FakeHost::new().with_unavailable_package("webhook");
    let spec = PackageSpec::new("webhook").with_fallback(unreachable_artifact(
        "http://127.0.0.1:1/webhook-{version}.tar.gz",
    ));

    let err = PackageInstaller::new(&host, &paths)
        .ensure(&spec)
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("package manager:"), "{message}");
    assert!(message.contains("release download:"), "{message}");
    assert!(!paths.resolve("/usr/local/bin/webhook").exists());
}

#[test]
fn fallback_with_unknown_archive_format_is_rejected() {
    let temp = TempDir::new().unwrap();
    let paths = HostPaths::with_root(temp.path());
    let host = FakeHost::new().with_unavailable_package("webhook");
    let spec = PackageSpec::new("webhook")
        .with_fallback(unreachable_artifact("http://127.0.0.1:1/webhook-{version}.exe"));

    let err = PackageInstaller::new(&host, &paths)
        .ensure(&spec)
        .unwrap_err();
    assert!(err.to_string().contains("Unsupported archive format"));
}
