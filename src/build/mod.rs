//! Build tool adapters
//!
//! One adapter per build kind. The orchestrator treats each as a black box
//! returning an artifact path or a `BuildError`.

pub mod cargo_package;
pub mod wasm_pack;

pub use cargo_package::CargoPackageBuild;
pub use wasm_pack::WasmPackBuild;

use crate::core::plan::BuildKind;
use crate::core::traits::BuildTool;
use std::sync::Arc;

/// Loader for build tool implementations
pub struct BuildToolLoader;

impl BuildToolLoader {
    /// Load the tool for a build kind
    pub fn load(kind: BuildKind) -> Arc<dyn BuildTool> {
        match kind {
            BuildKind::WasmPack => Arc::new(WasmPackBuild::new()),
            BuildKind::CargoPackage => Arc::new(CargoPackageBuild::new()),
        }
    }
}
