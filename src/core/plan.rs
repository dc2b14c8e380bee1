//! Release plan data model
//!
//! A plan is an ordered list of publish units. Ordering is significant and
//! total: the plan author encodes dependency order as list order, and the
//! orchestrator walks it strictly in sequence. Packages and registry
//! definitions are immutable once the plan is loaded.

use crate::core::error::PlanError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// Registry kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryKind {
    CratesIo,
    Npm,
}

impl RegistryKind {
    /// Get string representation of registry kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::CratesIo => "crates-io",
            RegistryKind::Npm => "npm",
        }
    }
}

/// Build tool kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildKind {
    WasmPack,
    CargoPackage,
}

impl BuildKind {
    /// Get string representation of build kind
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildKind::WasmPack => "wasm-pack",
            BuildKind::CargoPackage => "cargo-package",
        }
    }

    /// Parse a build kind tag from a plan file
    pub fn parse(tag: &str) -> Result<Self, PlanError> {
        match tag {
            "wasm-pack" => Ok(BuildKind::WasmPack),
            "cargo-package" => Ok(BuildKind::CargoPackage),
            other => Err(PlanError::UnknownBuildKind {
                name: other.to_string(),
            }),
        }
    }
}

/// What to do with the rest of the run when a unit fails
///
/// Dependency-sequenced releases usually cannot safely skip a failed link,
/// so halting is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Halt,
    Continue,
}

/// A versioned package rooted at a source directory
///
/// The version comes from the package's own manifest; release-train assumes
/// manifests already declare correct versions before a run begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub source_path: PathBuf,
}

impl Package {
    /// Parse the declared version, rejecting anything that is not SemVer
    pub fn parsed_version(&self) -> Result<semver::Version, PlanError> {
        semver::Version::parse(&self.version).map_err(|_| PlanError::InvalidVersion {
            package: self.name.clone(),
            version: self.version.clone(),
        })
    }
}

/// A registry definition from the plan's registry table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDef {
    pub name: String,
    pub kind: RegistryKind,
    /// Environment variable holding the auth token; `None` uses the
    /// kind's default
    pub token_env: Option<String>,
}

/// One atomic (package, registry, optional build) step in the release plan
#[derive(Debug, Clone)]
pub struct PublishUnit {
    pub package: Package,
    pub registry: String,
    pub build: Option<BuildKind>,
    /// Minimum wait after this unit completes before the next unit may
    /// start, allowing registry-side propagation of a just-published
    /// dependency
    pub settle_delay: Duration,
    pub on_failure: FailurePolicy,
}

/// An ordered release plan with its registry table
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    pub registries: HashMap<String, RegistryDef>,
    pub units: Vec<PublishUnit>,
}

impl ReleasePlan {
    /// Validate the plan before any unit runs
    ///
    /// Checks: at least one unit, every referenced registry defined, every
    /// version syntactically valid SemVer, no duplicate (package, registry)
    /// pairs.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.units.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();

        for unit in &self.units {
            if !self.registries.contains_key(&unit.registry) {
                return Err(PlanError::UnknownRegistry {
                    name: unit.registry.clone(),
                });
            }

            unit.package.parsed_version()?;

            let key = (unit.package.name.clone(), unit.registry.clone());
            if !seen.insert(key) {
                return Err(PlanError::DuplicateUnit {
                    package: unit.package.name.clone(),
                    registry: unit.registry.clone(),
                });
            }
        }

        Ok(())
    }

    /// Registry definition for a unit; plans are validated up front, so a
    /// miss is a programming error surfaced as `UnknownRegistry`
    pub fn registry_for(&self, unit: &PublishUnit) -> Result<&RegistryDef, PlanError> {
        self.registries
            .get(&unit.registry)
            .ok_or_else(|| PlanError::UnknownRegistry {
                name: unit.registry.clone(),
            })
    }
}
