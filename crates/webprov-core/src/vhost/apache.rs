use super::{VHostTemplate, template::WEBHOOK_LOCATION};

pub(super) fn render(t: &VHostTemplate) -> String {
    let aliases: String = t
        .aliases
        .iter()
        .map(|alias| format!("    ServerAlias {}\n", alias))
        .collect();
    format!(
        r#"# Managed by webprov for {domain}
<VirtualHost *:80>
    ServerName {domain}
{aliases}    DocumentRoot {root}

    <Directory {root}>
        Options Indexes FollowSymLinks
        AllowOverride All
        Require all granted
    </Directory>

    Header always set X-Frame-Options "SAMEORIGIN"
    Header always set X-Content-Type-Options "nosniff"

    ProxyPreserveHost On
    ProxyPass {location} {upstream}
    ProxyPassReverse {location} {upstream}

    ErrorLog ${{APACHE_LOG_DIR}}/{domain}-error.log
    CustomLog ${{APACHE_LOG_DIR}}/{domain}-access.log combined
</VirtualHost>
"#,
        domain = t.domain,
        aliases = aliases,
        root = t.webroot().display(),
        location = WEBHOOK_LOCATION,
        upstream = t.webhook_upstream(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn renders_virtual_host() {
        let site = SiteConfig::builder("example.com")
            .with_webroot("/srv/site")
            .build()
            .unwrap();
        let text = render(&VHostTemplate::new(&site, 9100));

        assert!(text.contains("    ServerName example.com\n"));
        assert!(text.contains("    ServerAlias www.example.com\n"));
        assert!(text.contains("    DocumentRoot /srv/site\n"));
        assert!(text.contains("<Directory /srv/site>"));
        assert!(text.contains("ProxyPass /webhook-deploy http://127.0.0.1:9100/hooks/deploy"));
        assert!(text.contains("${APACHE_LOG_DIR}/example.com-error.log"));
        assert!(text.ends_with("</VirtualHost>\n"));
    }
}
