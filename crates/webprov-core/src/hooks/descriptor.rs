//! Hook definitions in the webhook daemon's `hooks.json` format.
//!
//! The trigger rule is also evaluated natively so the behaviour of the
//! installed descriptor can be checked without running the daemon.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use super::DeploySecret;

/// Header GitHub uses for HMAC-SHA1 payload signatures.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HookDefinition {
    pub id: String,
    pub execute_command: String,
    pub command_working_directory: String,
    pub response_message: String,
    pub trigger_rule: TriggerRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRule {
    #[serde(rename = "match")]
    pub matcher: MatchRule,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub secret: String,
    pub parameter: Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    PayloadHmacSha1,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub source: ParameterSource,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    Header,
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRule")
            .field("kind", &self.kind)
            .field("secret", &"<redacted>")
            .field("parameter", &self.parameter)
            .finish()
    }
}

impl TriggerRule {
    /// Accept payloads signed with `secret` in the given header.
    pub fn payload_hmac_sha1(secret: &DeploySecret, header: &str) -> Self {
        Self {
            matcher: MatchRule {
                kind: MatchKind::PayloadHmacSha1,
                secret: secret.expose().to_string(),
                parameter: Parameter {
                    source: ParameterSource::Header,
                    name: header.to_string(),
                },
            },
        }
    }

    /// Whether a request with these headers and raw body satisfies the rule.
    ///
    /// Header names compare case-insensitively; the signature may carry a
    /// `sha1=` prefix. The MAC comparison is constant-time.
    pub fn evaluate(&self, headers: &[(&str, &str)], body: &[u8]) -> bool {
        let rule = &self.matcher;
        let Some(value) = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&rule.parameter.name))
            .map(|(_, value)| value.trim())
        else {
            return false;
        };
        let digest = value.strip_prefix("sha1=").unwrap_or(value);
        let Ok(signature) = hex::decode(digest) else {
            return false;
        };
        match rule.kind {
            MatchKind::PayloadHmacSha1 => {
                let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(rule.secret.as_bytes()) else {
                    return false;
                };
                mac.update(body);
                mac.verify_slice(&signature).is_ok()
            }
        }
    }
}

/// Outcome of routing one request to a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Executed,
    Rejected,
    NotFound,
}

/// The full `hooks.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookSet {
    pub hooks: Vec<HookDefinition>,
}

impl HookSet {
    pub fn new(hooks: Vec<HookDefinition>) -> Self {
        Self { hooks }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn get(&self, id: &str) -> Option<&HookDefinition> {
        self.hooks.iter().find(|hook| hook.id == id)
    }

    /// Route a request to hook `id`, running `execute` once if its trigger
    /// rule accepts the request.
    pub fn dispatch<F>(
        &self,
        id: &str,
        headers: &[(&str, &str)],
        body: &[u8],
        mut execute: F,
    ) -> anyhow::Result<Dispatch>
    where
        F: FnMut(&HookDefinition) -> anyhow::Result<()>,
    {
        let Some(hook) = self.get(id) else {
            return Ok(Dispatch::NotFound);
        };
        if !hook.trigger_rule.evaluate(headers, body) {
            tracing::warn!(hook = %hook.id, "rejected request with invalid signature");
            return Ok(Dispatch::Rejected);
        }
        execute(hook)?;
        Ok(Dispatch::Executed)
    }
}
