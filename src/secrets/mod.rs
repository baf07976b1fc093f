//! Secret resolution for deploy-key decryption.
//!
//! Site manifests reference secrets indirectly: `deploy.key` and `deploy.iv`
//! hold the *names* of secrets, never their values. Resolution goes through
//! the [`SecretStore`] trait so values are handed to subprocesses as argv
//! entries instead of being spliced into shell strings.

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while resolving a named secret.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret `{0}` is not set")]
    NotSet(String),

    #[error("secret `{0}` contains invalid unicode")]
    Invalid(String),
}

/// A source of named secret values.
pub trait SecretStore {
    /// Resolve the secret registered under `name`.
    fn resolve(&self, name: &str) -> Result<String, SecretError>;
}

/// Resolves secrets from the process environment.
///
/// This is the only store used in production; the manifest's `deploy.key`
/// and `deploy.iv` entries name environment variables provisioned by CI.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretStore for EnvSecrets {
    fn resolve(&self, name: &str) -> Result<String, SecretError> {
        match std::env::var(name) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Err(SecretError::NotSet(name.to_string())),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::Invalid(name.to_string())),
        }
    }
}

/// In-memory store for tests.
#[derive(Debug, Default, Clone)]
pub struct MapSecrets {
    values: HashMap<String, String>,
}

impl MapSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl SecretStore for MapSecrets {
    fn resolve(&self, name: &str) -> Result<String, SecretError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotSet(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_secrets_resolves_set_variable() {
        // SAFETY: test-local variable name, no concurrent reader cares.
        unsafe { std::env::set_var("MONODEPLOY_TEST_SECRET", "s3cret") };
        let value = EnvSecrets.resolve("MONODEPLOY_TEST_SECRET").unwrap();
        assert_eq!(value, "s3cret");
    }

    #[test]
    fn test_env_secrets_missing_variable() {
        let err = EnvSecrets.resolve("MONODEPLOY_TEST_UNSET").unwrap_err();
        assert!(matches!(err, SecretError::NotSet(name) if name == "MONODEPLOY_TEST_UNSET"));
    }

    #[test]
    fn test_map_secrets() {
        let mut store = MapSecrets::new();
        store.insert("encrypted_key", "aa00");
        assert_eq!(store.resolve("encrypted_key").unwrap(), "aa00");
        assert!(store.resolve("encrypted_iv").is_err());
    }
}
