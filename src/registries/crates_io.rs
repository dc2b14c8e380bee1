//! Crates.io client - publishes crate source archives via `cargo publish`
//!
//! The crate is packaged and uploaded by cargo itself; the artifact handed
//! to this client is the package source tree. Publish visibility can be
//! probed through the crates.io HTTP API, so the orchestrator may settle by
//! polling instead of sleeping out the full delay.

use crate::core::error::RegistryError;
use crate::core::plan::Package;
use crate::core::traits::{ArtifactRef, PublishAck, RegistryClient};
use crate::security::{CommandError, SafeCommandExecutor};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Registry kind name
const REGISTRY_NAME: &str = "crates-io";

/// Upper bound for one `cargo publish` invocation
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(300);

lazy_static! {
    static ref VERSION_EXISTS_RE: Regex = Regex::new(
        r"(?i)(crate version `[^`]+` is already uploaded|already exists on crates\.io)"
    )
    .expect("version-exists pattern is valid");
    static ref AUTH_FAILED_RE: Regex = Regex::new(
        r"(?i)(401 unauthorized|403 forbidden|authentication failed|invalid token|please provide a token|token.*(invalid|expired))"
    )
    .expect("auth-failed pattern is valid");
}

/// Classify a failed `cargo publish` from its stderr
fn classify_publish_failure(stderr: &str) -> RegistryError {
    if VERSION_EXISTS_RE.is_match(stderr) {
        return RegistryError::VersionAlreadyExists {
            registry: REGISTRY_NAME.to_string(),
        };
    }

    if AUTH_FAILED_RE.is_match(stderr) {
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
            details: format!("cargo publish timed out after {:?}", limit),
        },
        other => RegistryError::PackageRejected {
            registry: REGISTRY_NAME.to_string(),
            details: other.to_string(),
        },
    }
}

/// Crates.io registry client
pub struct CratesIoClient {
    http: reqwest::Client,
}

impl Default for CratesIoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CratesIoClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RegistryClient for CratesIoClient {
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
        _artifact: &ArtifactRef,
        credential: &SecretString,
    ) -> Result<PublishAck, RegistryError> {
        let mut executor =
            SafeCommandExecutor::new(&package.source_path).map_err(command_error)?;
        executor.set_timeout(PUBLISH_TIMEOUT);

        let output = executor
            .execute(
                "cargo",
                &["publish"],
                &[("CARGO_REGISTRY_TOKEN", credential.expose_secret())],
            )
            .await
            .map_err(command_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_publish_failure(&stderr));
        }

        let package_url = format!("https://crates.io/crates/{}/{}", package.name, package.version);
        Ok(PublishAck::new(REGISTRY_NAME, package, Some(package_url)))
    }

    fn supports_resolution_probe(&self) -> bool {
        true
    }

    async fn is_resolvable(&self, package: &Package) -> Result<bool, RegistryError> {
        let url = format!(
            "https://crates.io/api/v1/crates/{}/{}",
            package.name, package.version
        );

        // crates.io rejects requests without a User-Agent
        let response = self
            .http
            .get(&url)
            .header("User-Agent", "release-train")
            .send()
            .await
            .map_err(|e| RegistryError::TransientNetwork {
                registry: REGISTRY_NAME.to_string(),
                details: e.to_string(),
            })?;

        Ok(response.status().is_success())
    }
}
