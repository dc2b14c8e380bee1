pub mod build;
pub mod core;
pub mod orchestration;
pub mod registries;
pub mod security;

pub use crate::core::{
    ArtifactRef, BuildError, BuildKind, BuildTool, DEFAULT_PLAN_FILE, FailurePolicy, Package,
    PlanError, PlanLoader, PublishAck, PublishUnit, RegistryClient, RegistryDef, RegistryError,
    RegistryKind, ReleasePlan, RetryManager, RetryOptions,
};
pub use orchestration::{
    CancelFlag, Orchestrator, OrchestratorOptions, RunReport, RunState, UnitStatus,
};
pub use security::{CommandError, SafeCommandExecutor, SecureTokenManager};
