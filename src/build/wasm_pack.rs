//! wasm-pack build tool - produces an npm-publishable package from a
//! Rust crate
//!
//! Runs `wasm-pack build` in the package source directory and hands the
//! generated `pkg/` directory to the registry client. The artifact is
//! validated to exist before handoff.

use crate::core::error::BuildError;
use crate::core::plan::Package;
use crate::core::traits::{ArtifactRef, BuildTool};
use crate::security::{CommandError, SafeCommandExecutor};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Tool kind name
const TOOL_NAME: &str = "wasm-pack";

/// Upper bound for one build invocation
const BUILD_TIMEOUT: Duration = Duration::from_secs(600);

fn command_error(error: CommandError) -> BuildError {
    match error {
        CommandError::BinaryNotFound(_) => BuildError::ToolchainMissing {
            tool: TOOL_NAME.to_string(),
        },
        other => BuildError::CompilationFailed {
            tool: TOOL_NAME.to_string(),
            details: other.to_string(),
        },
    }
}

/// wasm-pack build step
pub struct WasmPackBuild {
    target: String,
}

impl Default for WasmPackBuild {
    fn default() -> Self {
        Self::new()
    }
}

impl WasmPackBuild {
    /// Create a build step targeting nodejs output
    pub fn new() -> Self {
        Self {
            target: "nodejs".to_string(),
        }
    }

    /// Override the wasm-pack target (e.g., "bundler", "web")
    pub fn with_target(target: &str) -> Self {
        Self {
            target: target.to_string(),
        }
    }

    /// Where wasm-pack writes its output for a package
    fn output_dir(package: &Package) -> PathBuf {
        package.source_path.join("pkg")
    }
}

#[async_trait]
impl BuildTool for WasmPackBuild {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn build(&self, package: &Package) -> Result<ArtifactRef, BuildError> {
        let mut executor =
            SafeCommandExecutor::new(&package.source_path).map_err(command_error)?;
        executor.set_timeout(BUILD_TIMEOUT);

        let output = executor
            .execute(
                "wasm-pack",
                &["build", "--release", "--target", &self.target],
                &[],
            )
            .await
            .map_err(command_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::CompilationFailed {
                tool: TOOL_NAME.to_string(),
                details: stderr.trim().to_string(),
            });
        }

        // wasm-pack writes the publishable package manifest into pkg/
        let output_dir = Self::output_dir(package);
        let manifest = output_dir.join("package.json");
        if tokio::fs::metadata(&manifest).await.is_err() {
            return Err(BuildError::ArtifactNotProduced {
                tool: TOOL_NAME.to_string(),
                artifact: manifest,
            });
        }

        Ok(ArtifactRef::built(output_dir))
    }
}
