//! NPM client - publishes package tarballs via `npm publish`
//!
//! Publishes from the artifact directory (the wasm-pack `pkg/` output for
//! built units, the source tree otherwise). The auth token is injected
//! through npm's per-registry environment configuration, never written to
//! an .npmrc on disk. Visibility is probed against the npm registry
//! metadata document.

use crate::core::error::RegistryError;
use crate::core::plan::Package;
use crate::core::traits::{ArtifactRef, PublishAck, RegistryClient};
use crate::security::{CommandError, SafeCommandExecutor};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Registry kind name
const REGISTRY_NAME: &str = "npm";

/// npm reads this variable as `//registry.npmjs.org/:_authToken`
const NPM_AUTH_ENV: &str = "npm_config_//registry.npmjs.org/:_authToken";

/// Upper bound for one `npm publish` invocation
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(300);

/// Patterns npm prints when the version is already taken
const CONFLICT_PATTERNS: &[&str] = &[
    "epublishconflict",
    "cannot publish over the previously published version",
    "you cannot publish over",
];

/// Patterns npm prints on authentication problems
const AUTH_PATTERNS: &[&str] = &["eneedauth", "e401", "e403", "invalid auth token", "unauthorized"];

/// NPM registry package metadata document
#[derive(Debug, Deserialize)]
struct NpmRegistryInfo {
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
}

/// Classify a failed `npm publish` from its stderr
fn classify_publish_failure(stderr: &str) -> RegistryError {
    let lowered = stderr.to_lowercase();

    if CONFLICT_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return RegistryError::VersionAlreadyExists {
            registry: REGISTRY_NAME.to_string(),
        };
    }

    if AUTH_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return RegistryError::AuthenticationFailed {
            registry: REGISTRY_NAME.to_string(),
        };
    }

    if super::is_transient_network(stderr) {
        return RegistryError::TransientNetwork {
            registry: REGISTRY_NAME.to_string(),
            details: stderr.trim().to_string(),
        };
    }

    RegistryError::PackageRejected {
        registry: REGISTRY_NAME.to_string(),
        details: stderr.trim().to_string(),
    }
}

fn command_error(error: CommandError) -> RegistryError {
    match error {
        CommandError::Timeout(limit) => RegistryError::TransientNetwork {
            registry: REGISTRY_NAME.to_string(),
            details: format!("npm publish timed out after {:?}", limit),
        },
        other => RegistryError::PackageRejected {
            registry: REGISTRY_NAME.to_string(),
            details: other.to_string(),
        },
    }
}

/// NPM registry client
pub struct NpmClient {
    http: reqwest::Client,
}

impl Default for NpmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NpmClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetch the registry metadata document for a package
    async fn fetch_package_info(&self, package_name: &str) -> Result<Option<NpmRegistryInfo>, RegistryError> {
        let url = format!("https://registry.npmjs.org/{}", package_name);
        let response = self.http.get(&url).send().await.map_err(|e| {
            RegistryError::TransientNetwork {
                registry: REGISTRY_NAME.to_string(),
                details: e.to_string(),
            }
        })?;

        // An unknown package has no metadata document yet
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(RegistryError::TransientNetwork {
                registry: REGISTRY_NAME.to_string(),
                details: format!("registry metadata request failed: HTTP {}", response.status()),
            });
        }

        let info = response.json::<NpmRegistryInfo>().await.map_err(|e| {
            RegistryError::TransientNetwork {
                registry: REGISTRY_NAME.to_string(),
                details: e.to_string(),
            }
        })?;

        Ok(Some(info))
    }
}

#[async_trait]
impl RegistryClient for NpmClient {
    fn name(&self) -> &str {
        REGISTRY_NAME
    }

    async fn authenticate(&self, credential: &SecretString) -> Result<(), RegistryError> {
        let token = credential.expose_secret();
        if token.trim().is_empty() || token.chars().any(char::is_whitespace) {
            return Err(RegistryError::AuthenticationFailed {
                registry: REGISTRY_NAME.to_string(),
            });
        }
        Ok(())
    }

    async fn publish(
        &self,
        package: &Package,
        artifact: &ArtifactRef,
        credential: &SecretString,
    ) -> Result<PublishAck, RegistryError> {
        let mut executor = SafeCommandExecutor::new(artifact.path()).map_err(command_error)?;
        executor.set_timeout(PUBLISH_TIMEOUT);

        let output = executor
            .execute(
                "npm",
                &["publish"],
                &[(NPM_AUTH_ENV, credential.expose_secret())],
            )
            .await
            .map_err(command_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_publish_failure(&stderr));
        }

        let package_url = format!("https://www.npmjs.com/package/{}", package.name);
        Ok(PublishAck::new(REGISTRY_NAME, package, Some(package_url)))
    }

    fn supports_resolution_probe(&self) -> bool {
        true
    }

    async fn is_resolvable(&self, package: &Package) -> Result<bool, RegistryError> {
        match self.fetch_package_info(&package.name).await? {
            Some(info) => Ok(info.versions.contains_key(&package.version)),
            None => Ok(false),
        }
    }
}
