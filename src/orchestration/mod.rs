//! Orchestration layer for release runs
//!
//! This module provides the sequencing engine that walks a release plan in
//! order, the run state machine, and the per-unit outcome report.

pub mod orchestrator;
pub mod run_report;
pub mod state;

// Re-export main types for convenience
pub use orchestrator::{CancelFlag, Orchestrator, OrchestratorOptions};
pub use run_report::{RunReport, UnitOutcome, UnitStatus};
pub use state::{RunState, RunStateMachine, StateError, StateTransition};
