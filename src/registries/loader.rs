//! Registry Loader - resolves registry kinds to client implementations
//!
//! The orchestrator stays closed over unit count and open over registry
//! variety: a new registry kind means a new `RegistryClient` impl and one
//! more match arm here.

use crate::core::plan::RegistryKind;
use crate::core::traits::RegistryClient;
use crate::registries::crates_io::CratesIoClient;
use crate::registries::npm::NpmClient;
use std::sync::Arc;

/// Loader for registry client implementations
pub struct RegistryLoader;

impl RegistryLoader {
    /// Load the client for a registry kind
    pub fn load(kind: RegistryKind) -> Arc<dyn RegistryClient> {
        match kind {
            RegistryKind::CratesIo => Arc::new(CratesIoClient::new()),
            RegistryKind::Npm => Arc::new(NpmClient::new()),
        }
    }
}
