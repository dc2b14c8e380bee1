//! SafeCommandExecutor: Type-safe command execution with injection prevention
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Uses `tokio::process::Command`, which never
//!   routes through a shell
//! - **Argument sanitization**: Arguments passed as a slice, never
//!   interpolated into shell strings
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout control**: Prevents hanging registry or build invocations

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist for security.
///
/// Only these commands can be executed via SafeCommandExecutor. The set
/// covers the registry and build tools release-train drives.
const ALLOWED_COMMANDS: &[&str] = &["cargo", "npm", "wasm-pack"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command binary was not found on PATH
    #[error("Command binary not found: {0}")]
    BinaryNotFound(String),

    /// Command execution failed (e.g., permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory
    /// does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.exists() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
        })
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration are terminated and reported as
    /// `CommandError::Timeout`.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Execute a command with whitelist validation and extra environment
    /// variables for the child process.
    ///
    /// Secrets are passed through `envs`, never through argument strings,
    /// so they cannot leak into process listings.
    pub async fn execute(
        &self,
        command: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<Output, CommandError> {
        // Whitelist validation: only pre-approved commands
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        // Windows-specific: npm is a .cmd shim, not an .exe
        #[cfg(target_os = "windows")]
        let command_name = if matches!(command, "npm") {
            format!("{}.cmd", command)
        } else {
            command.to_string()
        };

        #[cfg(not(target_os = "windows"))]
        let command_name = command.to_string();

        let mut cmd = Command::new(&command_name);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in envs {
            cmd.env(key, value);
        }

        let child = cmd.output();

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| CommandError::Timeout(limit))?,
            None => child.await,
        };

        result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::BinaryNotFound(command.to_string())
            } else {
                CommandError::ExecutionFailed(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_dir() -> PathBuf {
        std::env::temp_dir()
    }

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor.execute("rm", &["-rf", "/"], &[]).await;
        assert!(
            matches!(result, Err(CommandError::CommandNotAllowed(_))),
            "rm should be rejected as not in whitelist"
        );
    }

    #[tokio::test]
    async fn test_rejected_command_sh() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor.execute("sh", &["-c", "echo owned"], &[]).await;
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/that/does/not/exist");
        assert!(matches!(
            result,
            Err(CommandError::InvalidWorkingDirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_injection_attempt_via_arguments() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        // A semicolon in an argument is passed verbatim to the binary,
        // never interpreted by a shell
        let result = executor.execute("cargo", &["--version; rm -rf /"], &[]).await;
        match result {
            Ok(output) => assert!(!output.status.success()),
            Err(CommandError::BinaryNotFound(_)) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }

    #[tokio::test]
    async fn test_output_capture() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor.execute("cargo", &["--version"], &[]).await;

        match result {
            Ok(output) => {
                assert!(output.status.success());
                assert!(!output.stdout.is_empty(), "Should capture stdout");
            }
            // Environments without a toolchain report BinaryNotFound
            Err(CommandError::BinaryNotFound(_)) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
}
