use super::{VHostTemplate, template::WEBHOOK_LOCATION};

pub(super) fn render(t: &VHostTemplate) -> String {
    format!(
        r#"# Managed by webprov for {domain}
server {{
    listen 80;
    listen [::]:80;
    server_name {names};

    root {root};
    index index.html index.htm;

    add_header X-Frame-Options "SAMEORIGIN" always;
    add_header X-Content-Type-Options "nosniff" always;

    location / {{
        try_files $uri $uri/ =404;
    }}

    location {location} {{
        proxy_pass {upstream};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }}
}}
"#,
        domain = t.domain,
        names = t.server_names().join(" "),
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
    fn renders_server_block() {
        let site = SiteConfig::builder("example.com").build().unwrap();
        let text = render(&VHostTemplate::new(&site, 9000));

        assert!(text.contains("    server_name example.com www.example.com;\n"));
        assert!(text.contains("    root /var/www/example.com;\n"));
        assert!(text.contains("try_files $uri $uri/ =404;"));
        assert!(text.contains("location /webhook-deploy {"));
        assert!(text.contains("proxy_pass http://127.0.0.1:9000/hooks/deploy;"));
        assert!(text.contains("X-Frame-Options \"SAMEORIGIN\""));
        assert!(text.contains("X-Content-Type-Options \"nosniff\""));
        assert_eq!(text.matches('{').count(), text.matches('}').count());
    }
}
