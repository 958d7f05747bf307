use std::fmt;

use rand::RngCore;

/// Random bytes in a generated secret (40 hex characters).
pub const SECRET_BYTES: usize = 20;

/// Shared secret for webhook signatures.
///
/// Formatting redacts the value; only [`DeploySecret::expose`] yields it.
#[derive(Clone, PartialEq, Eq)]
pub struct DeploySecret(String);

impl DeploySecret {
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a known secret.
    pub fn from_string(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DeploySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeploySecret(<redacted>)")
    }
}

impl fmt::Display for DeploySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
