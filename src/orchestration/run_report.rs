//! Run Report - per-unit outcomes and end-of-run visibility
//!
//! Outcomes are appended in arrival order and never mutated afterwards.
//! Because registry publishes are irreversible, the report always shows
//! partial progress: operators must know exactly how far a release got.

use crate::core::plan::PublishUnit;
use crate::orchestration::state::RunState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Result of one publish unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    Published,
    Failed { reason: String },
    Skipped { reason: String },
}

impl UnitStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, UnitStatus::Published)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UnitStatus::Failed { .. })
    }
}

/// Recorded outcome for one unit
#[derive(Debug, Clone, Serialize)]
pub struct UnitOutcome {
    pub index: usize,
    pub package: String,
    pub version: String,
    pub registry: String,
    pub status: UnitStatus,
    pub duration_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

impl UnitOutcome {
    fn record(index: usize, unit: &PublishUnit, status: UnitStatus, duration_ms: u64) -> Self {
        Self {
            index,
            package: unit.package.name.clone(),
            version: unit.package.version.clone(),
            registry: unit.registry.clone(),
            status,
            duration_ms,
            recorded_at: Utc::now(),
        }
    }

    pub fn published(index: usize, unit: &PublishUnit, duration_ms: u64) -> Self {
        Self::record(index, unit, UnitStatus::Published, duration_ms)
    }

    pub fn failed(index: usize, unit: &PublishUnit, reason: String, duration_ms: u64) -> Self {
        Self::record(index, unit, UnitStatus::Failed { reason }, duration_ms)
    }

    pub fn skipped(index: usize, unit: &PublishUnit, reason: String) -> Self {
        Self::record(index, unit, UnitStatus::Skipped { reason }, 0)
    }
}

/// Aggregated outcomes for one release run
pub struct RunReport {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    final_state: RunState,
    outcomes: Vec<UnitOutcome>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            final_state: RunState::NotStarted,
            outcomes: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append an outcome; entries are never rewritten
    pub fn record(&mut self, outcome: UnitOutcome) {
        self.outcomes.push(outcome);
    }

    /// Mark the run finished in a terminal state
    pub fn finish(&mut self, state: RunState) {
        self.final_state = state;
    }

    pub fn final_state(&self) -> RunState {
        self.final_state
    }

    pub fn outcomes(&self) -> &[UnitOutcome] {
        &self.outcomes
    }

    /// Overall success: every unit published
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.status.is_published())
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.status.is_failed())
    }

    /// Process exit status for the invoking environment
    pub fn exit_code(&self) -> i32 {
        match self.final_state {
            RunState::Aborted => 130,
            _ if self.is_success() => 0,
            _ => 1,
        }
    }

    /// Human-readable per-unit summary
    ///
    /// Pure function of recorded data: generating it twice yields
    /// identical output.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=".repeat(60));
        lines.push(format!("📊 Release Summary ({})", self.run_id));
        lines.push("=".repeat(60));

        for outcome in &self.outcomes {
            let line = match &outcome.status {
                UnitStatus::Published => format!(
                    "✅ [{}] {} {} → {} ({}ms)",
                    outcome.index + 1,
                    outcome.package,
                    outcome.version,
                    outcome.registry,
                    outcome.duration_ms
                ),
                UnitStatus::Failed { reason } => format!(
                    "❌ [{}] {} {} → {}: {}",
                    outcome.index + 1,
                    outcome.package,
                    outcome.version,
                    outcome.registry,
                    reason
                ),
                UnitStatus::Skipped { reason } => format!(
                    "⏭️  [{}] {} {} → {}: {}",
                    outcome.index + 1,
                    outcome.package,
                    outcome.version,
                    outcome.registry,
                    reason
                ),
            };
            lines.push(line);
        }

        lines.push("=".repeat(60));
        let status = match self.final_state {
            RunState::Aborted => "🛑 ABORTED",
            _ if self.is_success() => "✅ SUCCESS",
            _ => "❌ FAILED",
        };
        lines.push(format!("Overall Status: {}", status));
        lines.push("=".repeat(60));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::{FailurePolicy, Package, PublishUnit};
    use std::path::PathBuf;
    use std::time::Duration;

    fn unit(name: &str, registry: &str) -> PublishUnit {
        PublishUnit {
            package: Package {
                name: name.to_string(),
                version: "1.0.0".to_string(),
                source_path: PathBuf::from(name),
            },
            registry: registry.to_string(),
            build: None,
            settle_delay: Duration::ZERO,
            on_failure: FailurePolicy::Halt,
        }
    }

    #[test]
    fn test_empty_report_is_not_success() {
        let report = RunReport::new();
        assert!(!report.is_success());
    }

    #[test]
    fn test_all_published_is_success() {
        let mut report = RunReport::new();
        report.record(UnitOutcome::published(0, &unit("a", "crates-io"), 10));
        report.record(UnitOutcome::published(1, &unit("b", "crates-io"), 12));
        report.finish(RunState::Succeeded);

        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_failed_unit_makes_run_fail() {
        let mut report = RunReport::new();
        report.record(UnitOutcome::published(0, &unit("a", "crates-io"), 10));
        report.record(UnitOutcome::failed(
            1,
            &unit("b", "crates-io"),
            "version exists".to_string(),
            8,
        ));
        report.record(UnitOutcome::skipped(
            2,
            &unit("c", "npm"),
            "earlier unit failed".to_string(),
        ));
        report.finish(RunState::Failed);

        assert!(!report.is_success());
        assert!(report.has_failures());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_aborted_run_exit_code() {
        let mut report = RunReport::new();
        report.record(UnitOutcome::published(0, &unit("a", "crates-io"), 10));
        report.record(UnitOutcome::skipped(
            1,
            &unit("b", "crates-io"),
            "run aborted by operator".to_string(),
        ));
        report.finish(RunState::Aborted);

        assert_eq!(report.exit_code(), 130);
    }

    #[test]
    fn test_outcomes_keep_arrival_order() {
        let mut report = RunReport::new();
        report.record(UnitOutcome::published(0, &unit("a", "crates-io"), 1));
        report.record(UnitOutcome::published(1, &unit("b", "crates-io"), 2));
        report.record(UnitOutcome::published(2, &unit("c", "npm"), 3));

        let packages: Vec<_> = report.outcomes().iter().map(|o| o.package.as_str()).collect();
        assert_eq!(packages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let mut report = RunReport::new();
        report.record(UnitOutcome::published(0, &unit("a", "crates-io"), 10));
        report.record(UnitOutcome::failed(
            1,
            &unit("b", "crates-io"),
            "rejected".to_string(),
            5,
        ));
        report.finish(RunState::Failed);

        assert_eq!(report.summary(), report.summary());
    }

    #[test]
    fn test_summary_lists_every_unit() {
        let mut report = RunReport::new();
        report.record(UnitOutcome::published(0, &unit("yrs", "crates-io"), 10));
        report.record(UnitOutcome::skipped(
            1,
            &unit("ywasm", "npm"),
            "earlier unit failed".to_string(),
        ));
        report.finish(RunState::Failed);

        let summary = report.summary();
        assert!(summary.contains("yrs"));
        assert!(summary.contains("ywasm"));
        assert!(summary.contains("Overall Status: ❌ FAILED"));
    }

    #[test]
    fn test_unit_status_serialization() {
        let status = UnitStatus::Failed {
            reason: "auth".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("FAILED"));
        assert!(json.contains("auth"));
    }
}
