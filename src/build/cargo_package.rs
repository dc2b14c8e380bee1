//! cargo-package build step - produces a .crate archive from a crate source
//! tree
//!
//! Useful as a pre-publish validation transform: `cargo package` performs
//! the same packaging cargo publish would, so a unit can surface packaging
//! problems as a build failure with nothing uploaded.

use crate::core::error::BuildError;
use crate::core::plan::Package;
use crate::core::traits::{ArtifactRef, BuildTool};
use crate::security::{CommandError, SafeCommandExecutor};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Tool kind name
const TOOL_NAME: &str = "cargo-package";

/// Upper bound for one packaging invocation
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

/// cargo package build step
#[derive(Default)]
pub struct CargoPackageBuild {
    _private: (),
}

impl CargoPackageBuild {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Where cargo writes the packaged archive
    fn archive_path(package: &Package) -> PathBuf {
        package
            .source_path
            .join("target")
            .join("package")
            .join(format!("{}-{}.crate", package.name, package.version))
    }
}

#[async_trait]
impl BuildTool for CargoPackageBuild {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn build(&self, package: &Package) -> Result<ArtifactRef, BuildError> {
        let mut executor =
            SafeCommandExecutor::new(&package.source_path).map_err(command_error)?;
        executor.set_timeout(BUILD_TIMEOUT);

        let output = executor
            .execute("cargo", &["package", "--allow-dirty"], &[])
            .await
            .map_err(command_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::CompilationFailed {
                tool: TOOL_NAME.to_string(),
                details: stderr.trim().to_string(),
            });
        }

        let archive = Self::archive_path(package);
        if tokio::fs::metadata(&archive).await.is_err() {
            return Err(BuildError::ArtifactNotProduced {
                tool: TOOL_NAME.to_string(),
                artifact: archive,
            });
        }

        Ok(ArtifactRef::built(archive))
    }
}
