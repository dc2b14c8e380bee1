//! Release plan loading
//!
//! Reads a YAML plan file, resolves each unit's package identity from its
//! own manifest (Cargo.toml or package.json), and validates the assembled
//! plan before the orchestrator sees it.
//!
//! # Plan file format
//!
//! ```yaml
//! version: "1"
//! registries:
//!   crates-io:
//!     kind: crates-io
//!   npm:
//!     kind: npm
//!     token_env: NPM_TOKEN
//! defaults:
//!   settle_delay_secs: 15
//! units:
//!   - path: yrs
//!     registry: crates-io
//!     settle_delay_secs: 20
//!   - path: ywasm
//!     registry: npm
//!     build: wasm-pack
//! ```

use crate::core::error::PlanError;
use crate::core::plan::{
    BuildKind, FailurePolicy, Package, PublishUnit, RegistryDef, RegistryKind, ReleasePlan,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Default plan file name
pub const DEFAULT_PLAN_FILE: &str = "release-plan.yml";

/// Root plan file object
#[derive(Debug, Deserialize)]
struct PlanFile {
    /// Schema version (required)
    #[allow(dead_code)]
    version: String,

    /// Registry table (required)
    registries: HashMap<String, RegistryEntry>,

    /// Defaults applied when a unit omits a field (optional)
    #[serde(default)]
    defaults: PlanDefaults,

    /// Ordered publish units (required)
    units: Vec<UnitEntry>,
}

#[derive(Debug, Deserialize)]
struct RegistryEntry {
    kind: RegistryKind,

    #[serde(default)]
    token_env: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlanDefaults {
    #[serde(default)]
    settle_delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UnitEntry {
    /// Package directory, relative to the plan file
    path: String,

    /// Key into the registry table
    registry: String,

    /// Build tool tag (optional)
    #[serde(default)]
    build: Option<String>,

    /// Settle delay override in seconds (optional)
    #[serde(default)]
    settle_delay_secs: Option<u64>,

    /// Failure policy override (optional, default: halt)
    #[serde(default)]
    on_failure: Option<FailurePolicy>,
}

/// Minimal Cargo.toml shape for package identity
#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: CargoPackageSection,
}

#[derive(Debug, Deserialize)]
struct CargoPackageSection {
    name: String,
    version: String,
}

/// Minimal package.json shape for package identity
#[derive(Debug, Deserialize)]
struct PackageJsonManifest {
    name: String,
    version: String,
}

/// Loads and validates release plans
pub struct PlanLoader;

impl PlanLoader {
    /// Load a release plan from a YAML file
    ///
    /// Unit paths are resolved relative to the plan file's directory. The
    /// returned plan has already passed `ReleasePlan::validate`.
    pub async fn load(plan_path: &Path) -> Result<ReleasePlan, PlanError> {
        let content = fs::read_to_string(plan_path).await?;
        let file: PlanFile = serde_yaml::from_str(&content)?;

        let base_dir = plan_path.parent().unwrap_or_else(|| Path::new("."));

        let registries = file
            .registries
            .into_iter()
            .map(|(name, entry)| {
                let def = RegistryDef {
                    name: name.clone(),
                    kind: entry.kind,
                    token_env: entry.token_env,
                };
                (name, def)
            })
            .collect();

        let mut units = Vec::with_capacity(file.units.len());
        for entry in file.units {
            let source_path = base_dir.join(&entry.path);
            let (name, version) = Self::read_manifest(&source_path).await?;

            let build = match entry.build.as_deref() {
                Some(tag) => Some(BuildKind::parse(tag)?),
                None => None,
            };

            let settle_secs = entry
                .settle_delay_secs
                .or(file.defaults.settle_delay_secs)
                .unwrap_or(0);

            units.push(PublishUnit {
                package: Package {
                    name,
                    version,
                    source_path,
                },
                registry: entry.registry,
                build,
                settle_delay: Duration::from_secs(settle_secs),
                on_failure: entry.on_failure.unwrap_or_default(),
            });
        }

        let plan = ReleasePlan { registries, units };
        plan.validate()?;

        Ok(plan)
    }

    /// Read package identity from the package's own manifest
    ///
    /// Cargo.toml wins when both manifests are present, matching the
    /// registry most likely to consume the source tree directly.
    async fn read_manifest(source_path: &Path) -> Result<(String, String), PlanError> {
        let cargo_toml = source_path.join("Cargo.toml");
        if fs::metadata(&cargo_toml).await.is_ok() {
            let content = fs::read_to_string(&cargo_toml).await?;
            let manifest: CargoManifest =
                toml::from_str(&content).map_err(|e| PlanError::ManifestInvalid {
                    path: cargo_toml.clone(),
                    details: e.to_string(),
                })?;
            return Ok((manifest.package.name, manifest.package.version));
        }

        let package_json = source_path.join("package.json");
        if fs::metadata(&package_json).await.is_ok() {
            let content = fs::read_to_string(&package_json).await?;
            let manifest: PackageJsonManifest =
                serde_json::from_str(&content).map_err(|e| PlanError::ManifestInvalid {
                    path: package_json.clone(),
                    details: e.to_string(),
                })?;
            return Ok((manifest.name, manifest.version));
        }

        Err(PlanError::ManifestNotFound {
            path: source_path.to_path_buf(),
        })
    }
}
