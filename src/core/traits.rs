//! Core traits and types for release orchestration
//!
//! This module defines the capability seams the orchestrator is polymorphic
//! over: registry clients (authenticate + publish) and build tools
//! (build → artifact). New registry or tool kinds are added by implementing
//! these traits, never by modifying the orchestrator.

use crate::core::error::{BuildError, RegistryError};
use crate::core::plan::Package;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Artifacts
// ============================================================================

/// Reference to a publishable artifact on disk
///
/// For units without a build step this points at the package source tree;
/// registries that package from source (cargo) publish straight from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    path: PathBuf,
}

impl ArtifactRef {
    /// Artifact produced by a build tool
    pub fn built<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The package source tree itself, for units with no build step
    pub fn source_tree<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// Publishing
// ============================================================================

/// Acknowledgment returned by a registry after a successful publish
///
/// The orchestrator needs no further payload; the version is durably
/// visible to consumers after registry-side propagation completes.
#[derive(Debug, Clone, Serialize)]
pub struct PublishAck {
    pub registry: String,
    pub package: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_url: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl PublishAck {
    pub fn new(registry: &str, package: &Package, package_url: Option<String>) -> Self {
        Self {
            registry: registry.to_string(),
            package: package.name.clone(),
            version: package.version.clone(),
            package_url,
            received_at: Utc::now(),
        }
    }
}

// ============================================================================
// Registry Client Trait
// ============================================================================

/// Capability set implemented once per registry kind
///
/// Implementations translate registry-specific wire protocols (source
/// archive upload, tarball upload) into the common error taxonomy. A client
/// never retries on its own; retry policy lives in the orchestrator.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Registry kind name (e.g., "crates-io", "npm")
    fn name(&self) -> &str;

    /// Verify the supplied credential is usable before any publish
    async fn authenticate(&self, credential: &SecretString) -> Result<(), RegistryError>;

    /// Publish one package version; success makes it durably visible to
    /// consumers, though not necessarily immediately
    async fn publish(
        &self,
        package: &Package,
        artifact: &ArtifactRef,
        credential: &SecretString,
    ) -> Result<PublishAck, RegistryError>;

    /// Whether this registry can answer `is_resolvable` queries
    ///
    /// When false, the orchestrator falls back to a fixed settle wait.
    fn supports_resolution_probe(&self) -> bool {
        false
    }

    /// Check whether the package version is already visible to consumers
    async fn is_resolvable(&self, package: &Package) -> Result<bool, RegistryError>;
}

// ============================================================================
// Build Tool Trait
// ============================================================================

/// Pre-publish transform producing a distributable artifact from source
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Tool kind name (e.g., "wasm-pack")
    fn name(&self) -> &str;

    /// Build the package and return the artifact location, verified to
    /// exist before handoff to the registry client
    async fn build(&self, package: &Package) -> Result<ArtifactRef, BuildError>;
}
