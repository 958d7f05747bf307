//! Text of the deploy script and the webhook service unit.

use std::path::Path;

use crate::config::SiteConfig;
use crate::host::layout;
use crate::repo::WEBROOT_MODE;
use crate::vhost::WEBHOOK_HOOK_ID;

use super::{DeploySecret, HookDefinition, HookSet, SIGNATURE_HEADER, TriggerRule};

pub fn deploy_script(site: &SiteConfig) -> String {
    let webroot = site.webroot().display();
    format!(
        r#"#!/usr/bin/env bash
# Managed by webprov: run by the webhook daemon on every signed push.
set -euo pipefail

cd {webroot}
git pull --ff-only origin {branch}
chown -R {owner} {webroot}
chmod -R {mode} {webroot}
echo "$(date -Is) deployed {branch} $(git rev-parse --short HEAD)" >> {log}
"#,
        webroot = webroot,
        branch = site.branch(),
        owner = site.owner_spec(),
        mode = WEBROOT_MODE,
        log = layout::deploy_log(site.domain()).display(),
    )
}

pub fn hook_set(site: &SiteConfig, secret: &DeploySecret) -> HookSet {
    HookSet::new(vec![HookDefinition {
        id: WEBHOOK_HOOK_ID.to_string(),
        execute_command: layout::deploy_script(site.domain())
            .to_string_lossy()
            .into_owned(),
        command_working_directory: site.webroot().to_string_lossy().into_owned(),
        response_message: format!("Deploying {}", site.domain()),
        trigger_rule: TriggerRule::payload_hmac_sha1(secret, SIGNATURE_HEADER),
    }])
}

pub fn service_unit(site: &SiteConfig, webhook_binary: &Path, webhook_port: u16) -> String {
    format!(
        r#"[Unit]
Description=Webhook listener for {domain} deploys
After=network.target

[Service]
Type=simple
User={user}
Group={group}
ExecStart={binary} -hooks {hooks} -port {port} -ip 127.0.0.1 -verbose
Restart=on-failure
RestartSec=5

[Install]
WantedBy=multi-user.target
"#,
        domain = site.domain(),
        user = site.service_user(),
        group = site.service_group(),
        binary = webhook_binary.display(),
        hooks = layout::hooks_file().display(),
        port = webhook_port,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_script_pulls_normalizes_and_logs() {
        let site = SiteConfig::builder("example.com").build().unwrap();
        let script = deploy_script(&site);

        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        assert!(script.contains("set -euo pipefail"));
        assert!(script.contains("cd /var/www/example.com\n"));
        assert!(script.contains("git pull --ff-only origin main\n"));
        assert!(script.contains("chown -R www-data:www-data /var/www/example.com\n"));
        assert!(script.contains("chmod -R 755 /var/www/example.com\n"));
        assert!(script.contains(">> /var/log/webprov/deploy-example.com.log"));
    }

    #[test]
    fn hook_points_at_deploy_script() {
        let site = SiteConfig::builder("example.com").build().unwrap();
        let hooks = hook_set(&site, &DeploySecret::from_string("abc"));
        let hook = hooks.get("deploy").unwrap();

        assert_eq!(hook.execute_command, "/usr/local/bin/deploy-example.com.sh");
        assert_eq!(hook.command_working_directory, "/var/www/example.com");
        assert_eq!(hook.trigger_rule.matcher.secret, "abc");
        assert_eq!(hook.trigger_rule.matcher.parameter.name, "X-Hub-Signature");
    }

    #[test]
    fn unit_runs_as_service_user_and_restarts() {
        let site = SiteConfig::builder("example.com").build().unwrap();
        let unit = service_unit(&site, Path::new("/usr/bin/webhook"), 9000);

        assert!(unit.contains(
            "ExecStart=/usr/bin/webhook -hooks /etc/webhook/hooks.json -port 9000 -ip 127.0.0.1 -verbose\n"
        ));
        assert!(unit.contains("User=www-data\n"));
        assert!(unit.contains("Restart=on-failure\n"));
        assert!(unit.contains("WantedBy=multi-user.target\n"));
    }
}
