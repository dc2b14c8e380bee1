//! Secure token manager with memory-safe handling and masking capabilities
//!
//! This module resolves registry authentication tokens from the
//! environment, using the `secrecy` crate to prevent accidental token
//! exposure in logs or memory dumps. Token contents are opaque to
//! release-train; they are handed to registry clients as supplied.

use crate::core::plan::{RegistryDef, RegistryKind};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::env;

/// Default environment variable per registry kind
const REGISTRY_TOKENS: &[(RegistryKind, &str)] = &[
    (RegistryKind::CratesIo, "CARGO_REGISTRY_TOKEN"),
    (RegistryKind::Npm, "NPM_TOKEN"),
];

/// Secure token manager for registry authentication
#[derive(Debug, Default)]
pub struct SecureTokenManager {
    _private: (),
}

impl SecureTokenManager {
    /// Creates a new SecureTokenManager
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// The environment variable consulted for a registry definition
    ///
    /// A plan-level `token_env` override wins; otherwise the kind's
    /// default applies.
    pub fn token_env(&self, registry: &RegistryDef) -> String {
        if let Some(ref env_name) = registry.token_env {
            return env_name.clone();
        }

        REGISTRY_TOKENS
            .iter()
            .find(|(kind, _)| *kind == registry.kind)
            .map(|(_, env_name)| env_name.to_string())
            .unwrap_or_else(|| format!("{}_TOKEN", registry.kind.as_str().to_uppercase()))
    }

    /// Retrieves the token for a registry from the environment
    ///
    /// Returns `None` when the variable is unset or empty.
    pub fn get_token(&self, registry: &RegistryDef) -> Option<SecretString> {
        let token_value = env::var(self.token_env(registry)).ok()?;
        if token_value.is_empty() {
            return None;
        }
        Some(SecretString::new(token_value.into()))
    }

    /// Checks if a token is set for the registry
    pub fn has_token(&self, registry: &RegistryDef) -> bool {
        self.get_token(registry).is_some()
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification.
    /// Tokens shorter than 10 characters are fully masked as "****".
    pub fn mask_token(&self, token: &str) -> String {
        if token.is_empty() || token.len() < 10 {
            return "****".to_string();
        }

        let prefix = &token[..3];
        let suffix = &token[token.len() - 3..];
        format!("{}...{}", prefix, suffix)
    }

    /// Masks the registry's token wherever it appears in a string
    ///
    /// Applied to subprocess output before it is recorded in the run
    /// report, so registry stderr cannot echo a credential back.
    pub fn mask_tokens_in_string(&self, registry: &RegistryDef, text: &str) -> String {
        let Some(token) = self.get_token(registry) else {
            return text.to_string();
        };

        let token_str = token.expose_secret();
        let escaped = regex::escape(token_str);
        match Regex::new(&escaped) {
            Ok(re) => {
                let masked = self.mask_token(token_str);
                re.replace_all(text, masked.as_str()).to_string()
            }
            Err(_) => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crates_def(token_env: Option<&str>) -> RegistryDef {
        RegistryDef {
            name: "crates-io".to_string(),
            kind: RegistryKind::CratesIo,
            token_env: token_env.map(str::to_string),
        }
    }

    fn npm_def() -> RegistryDef {
        RegistryDef {
            name: "npm".to_string(),
            kind: RegistryKind::Npm,
            token_env: None,
        }
    }

    #[test]
    fn test_default_token_env_per_kind() {
        let manager = SecureTokenManager::new();
        assert_eq!(manager.token_env(&crates_def(None)), "CARGO_REGISTRY_TOKEN");
        assert_eq!(manager.token_env(&npm_def()), "NPM_TOKEN");
    }

    #[test]
    fn test_token_env_override_wins() {
        let manager = SecureTokenManager::new();
        let def = crates_def(Some("MY_PRIVATE_REGISTRY_TOKEN"));
        assert_eq!(manager.token_env(&def), "MY_PRIVATE_REGISTRY_TOKEN");
    }

    #[test]
    fn test_get_token_returns_secret_when_env_var_set() {
        unsafe {
            env::set_var("RELEASE_TRAIN_TEST_TOKEN_A", "test-crates-token-12345");
        }
        let manager = SecureTokenManager::new();
        let def = crates_def(Some("RELEASE_TRAIN_TEST_TOKEN_A"));
        let token = manager.get_token(&def);
        assert!(token.is_some());
        assert_eq!(token.unwrap().expose_secret(), "test-crates-token-12345");
        unsafe {
            env::remove_var("RELEASE_TRAIN_TEST_TOKEN_A");
        }
    }

    #[test]
    fn test_get_token_returns_none_when_unset() {
        unsafe {
            env::remove_var("RELEASE_TRAIN_TEST_TOKEN_B");
        }
        let manager = SecureTokenManager::new();
        let def = crates_def(Some("RELEASE_TRAIN_TEST_TOKEN_B"));
        assert!(manager.get_token(&def).is_none());
        assert!(!manager.has_token(&def));
    }

    #[test]
    fn test_get_token_returns_none_when_empty() {
        unsafe {
            env::set_var("RELEASE_TRAIN_TEST_TOKEN_C", "");
        }
        let manager = SecureTokenManager::new();
        let def = crates_def(Some("RELEASE_TRAIN_TEST_TOKEN_C"));
        assert!(manager.get_token(&def).is_none());
        unsafe {
            env::remove_var("RELEASE_TRAIN_TEST_TOKEN_C");
        }
    }

    #[test]
    fn test_mask_token_with_short_token() {
        let manager = SecureTokenManager::new();
        assert_eq!(manager.mask_token("short"), "****");
        assert_eq!(manager.mask_token(""), "****");
    }

    #[test]
    fn test_mask_token_with_long_token() {
        let manager = SecureTokenManager::new();
        assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
        assert_eq!(manager.mask_token("very-long-token-string"), "ver...ing");
    }

    #[test]
    fn test_mask_tokens_in_string_with_token() {
        unsafe {
            env::set_var("RELEASE_TRAIN_TEST_TOKEN_D", "secret-crates-token-12345");
        }
        let manager = SecureTokenManager::new();
        let def = crates_def(Some("RELEASE_TRAIN_TEST_TOKEN_D"));
        let input = "error: failed with token secret-crates-token-12345";
        let output = manager.mask_tokens_in_string(&def, input);
        assert!(output.contains("sec...345"));
        assert!(!output.contains("secret-crates-token-12345"));
        unsafe {
            env::remove_var("RELEASE_TRAIN_TEST_TOKEN_D");
        }
    }

    #[test]
    fn test_mask_tokens_in_string_without_token() {
        unsafe {
            env::remove_var("RELEASE_TRAIN_TEST_TOKEN_E");
        }
        let manager = SecureTokenManager::new();
        let def = crates_def(Some("RELEASE_TRAIN_TEST_TOKEN_E"));
        let input = "nothing to mask here";
        assert_eq!(manager.mask_tokens_in_string(&def, input), input);
    }
}
