use crate::config::Secret;
use eyre::{eyre, WrapErr};
use std::collections::HashMap;

pub struct SecretValue(pub String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        SecretValue(value.into())
    }

    /// Compares against a request-supplied value without short-circuiting on the first
    /// differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        let mut diff = expected.len() ^ candidate.len();
        for (i, b) in candidate.iter().enumerate() {
            let e = expected.get(i).copied().unwrap_or(0);
            diff |= usize::from(e ^ b);
        }
        diff == 0
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

#[derive(Debug)]
pub struct Secrets;

impl Secrets {
    pub fn get_secret(&self, secret: &Secret) -> eyre::Result<SecretValue> {
        match secret {
            Secret::Literal(value) => Ok(SecretValue::new(value.as_str())),
            Secret::FromEnvVar { env_var } => {
                let value = std::env::var(env_var)
                    .wrap_err_with(|| format!("environment variable '{}' not set", env_var))?;
                Ok(SecretValue(value))
            }
            Secret::FromToml { toml, key } => {
                let secrets_file = std::fs::read_to_string(toml)
                    .wrap_err_with(|| format!("failed to read secrets file '{}'", toml))?;
                let mut secrets: HashMap<String, String> = toml::from_str(&secrets_file)
                    .wrap_err_with(|| format!("failed to parse secrets file '{}'", toml))?;
                secrets
                    .remove(key.as_str())
                    .ok_or_else(|| eyre!("key '{}' not found in secrets file '{}'", key, toml))
                    .map(SecretValue::new)
            }
        }
    }
}
