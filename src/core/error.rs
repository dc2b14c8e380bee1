//! Error handling for release orchestration
//!
//! This module provides the error taxonomy for release runs with recovery
//! guidance, using the thiserror crate for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a registry when publishing a package version
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("[{registry}] 認証に失敗しました")]
    AuthenticationFailed { registry: String },

    #[error("[{registry}] 同じバージョンが既に公開されています")]
    VersionAlreadyExists { registry: String },

    #[error("[{registry}] パッケージが拒否されました: {details}")]
    PackageRejected { registry: String, details: String },

    #[error("[{registry}] 一時的なネットワークエラーが発生しました: {details}")]
    TransientNetwork { registry: String, details: String },
}

impl RegistryError {
    /// Get the registry name associated with this error
    pub fn registry(&self) -> &str {
        match self {
            Self::AuthenticationFailed { registry }
            | Self::VersionAlreadyExists { registry }
            | Self::PackageRejected { registry, .. }
            | Self::TransientNetwork { registry, .. } => registry,
        }
    }

    /// Check if this error may be retried automatically
    ///
    /// Only transient network failures qualify; every other kind is
    /// terminal on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. })
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::VersionAlreadyExists { .. } => "VERSION_ALREADY_EXISTS",
            Self::PackageRejected { .. } => "PACKAGE_REJECTED",
            Self::TransientNetwork { .. } => "TRANSIENT_NETWORK",
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::AuthenticationFailed { .. } => vec![
                "認証情報を確認してください",
                "環境変数が正しく設定されているか確認してください（例: NPM_TOKEN, CARGO_REGISTRY_TOKEN）",
                "トークンの有効期限を確認してください",
            ],
            Self::VersionAlreadyExists { .. } => vec![
                "バージョン番号を更新してください",
                "マニフェストのversionフィールドを確認してください",
            ],
            Self::PackageRejected { .. } => vec![
                "レジストリのエラーメッセージを確認してください",
                "パッケージのメタデータを修正してください",
            ],
            Self::TransientNetwork { .. } => vec![
                "インターネット接続を確認してください",
                "しばらく待ってから再試行してください",
            ],
        }
    }
}

/// Errors reported by a build tool while producing a publishable artifact
///
/// Build failures are never retried; a later unit may not depend on this
/// package's freshly built artifact, so the failure belongs to the owning
/// unit alone.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("[{tool}] ビルドツールが見つかりません")]
    ToolchainMissing { tool: String },

    #[error("[{tool}] コンパイルに失敗しました: {details}")]
    CompilationFailed { tool: String, details: String },

    #[error("[{tool}] 成果物が生成されませんでした: {artifact}")]
    ArtifactNotProduced { tool: String, artifact: PathBuf },
}

impl BuildError {
    /// Get the build tool name associated with this error
    pub fn tool(&self) -> &str {
        match self {
            Self::ToolchainMissing { tool }
            | Self::CompilationFailed { tool, .. }
            | Self::ArtifactNotProduced { tool, .. } => tool,
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ToolchainMissing { .. } => "TOOLCHAIN_MISSING",
            Self::CompilationFailed { .. } => "COMPILATION_FAILED",
            Self::ArtifactNotProduced { .. } => "ARTIFACT_NOT_PRODUCED",
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ToolchainMissing { .. } => vec![
                "ビルドツールがインストールされているか確認してください",
                "PATHにツールの場所が含まれているか確認してください",
            ],
            Self::CompilationFailed { .. } => vec![
                "コンパイルエラーを確認してください",
                "ソースコードを修正してください",
            ],
            Self::ArtifactNotProduced { .. } => vec![
                "ビルドツールの出力を確認してください",
                "成果物の出力先パスを確認してください",
            ],
        }
    }
}

/// Errors raised while loading and validating a release plan
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("リリースプランに公開対象がありません")]
    EmptyPlan,

    #[error("未定義のレジストリが参照されています: {name}")]
    UnknownRegistry { name: String },

    #[error("未対応のビルド種別です: {name}")]
    UnknownBuildKind { name: String },

    #[error("マニフェストが見つかりません: {path}")]
    ManifestNotFound { path: PathBuf },

    #[error("マニフェストを解析できません: {path}: {details}")]
    ManifestInvalid { path: PathBuf, details: String },

    #[error("無効なバージョン番号です: {package} {version}")]
    InvalidVersion { package: String, version: String },

    #[error("同じパッケージとレジストリの組が重複しています: {package} → {registry}")]
    DuplicateUnit { package: String, registry: String },

    #[error("プランファイルを読み込めません: {0}")]
    Io(#[from] std::io::Error),

    #[error("プランファイルを解析できません: {0}")]
    Parse(#[from] serde_yaml::Error),
}
