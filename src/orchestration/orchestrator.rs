//! Orchestrator - walks a release plan strictly in order
//!
//! Manages the complete release workflow:
//! - Per-unit authenticate → build → publish with typed error capture
//! - Bounded retry of transient network failures only
//! - Settle waits between units for registry-side propagation
//! - Stop-on-first-failure (default) or continue, per unit
//! - Cancellation at unit boundaries, never mid-publish
//!
//! The total order of units is the mechanism by which dependency
//! correctness is guaranteed: unit i+1 never begins before unit i's
//! outcome is recorded and its settle delay has fully elapsed.

use crate::build::BuildToolLoader;
use crate::core::error::{BuildError, PlanError, RegistryError};
use crate::core::plan::{BuildKind, FailurePolicy, PublishUnit, ReleasePlan};
use crate::core::retry::{RetryManager, RetryOptions};
use crate::core::traits::{ArtifactRef, BuildTool, PublishAck, RegistryClient};
use crate::orchestration::run_report::{RunReport, UnitOutcome};
use crate::orchestration::state::{RunState, RunStateMachine};
use crate::registries::RegistryLoader;
use crate::security::SecureTokenManager;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Cooperative stop signal, checked at unit boundaries only
///
/// A registry call may already be non-idempotently in flight, so the
/// in-flight unit always finishes before the run transitions to Aborted.
#[derive(Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Orchestrator options
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Treat every unit as `on_failure: continue`
    pub continue_on_error: bool,

    /// Retry behavior for transient network failures
    pub retry: RetryOptions,

    /// Interval between resolution probes while settling
    pub settle_poll_interval: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            retry: RetryOptions::default(),
            settle_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Everything that can sink a single unit
#[derive(Error, Debug)]
enum UnitFailure {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Release orchestrator
pub struct Orchestrator {
    plan: ReleasePlan,
    clients: HashMap<String, Arc<dyn RegistryClient>>,
    build_tools: HashMap<BuildKind, Arc<dyn BuildTool>>,
    tokens: SecureTokenManager,
    retry: RetryManager,
    state: RunStateMachine,
    cancel: CancelFlag,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Create an orchestrator wired to the real registry and build
    /// adapters referenced by the plan
    pub fn from_plan(plan: ReleasePlan, options: OrchestratorOptions) -> Self {
        let clients = plan
            .registries
            .values()
            .map(|def| (def.name.clone(), RegistryLoader::load(def.kind)))
            .collect();

        let mut build_tools = HashMap::new();
        for unit in &plan.units {
            if let Some(kind) = unit.build {
                build_tools
                    .entry(kind)
                    .or_insert_with(|| BuildToolLoader::load(kind));
            }
        }

        Self::with_components(plan, clients, build_tools, options)
    }

    /// Create an orchestrator from explicit components
    pub fn with_components(
        plan: ReleasePlan,
        clients: HashMap<String, Arc<dyn RegistryClient>>,
        build_tools: HashMap<BuildKind, Arc<dyn BuildTool>>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            plan,
            clients,
            build_tools,
            tokens: SecureTokenManager::new(),
            retry: RetryManager::new(options.retry.clone()),
            state: RunStateMachine::new(),
            cancel: CancelFlag::new(),
            options,
        }
    }

    /// Handle the binary uses to request a stop between units
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Execute the plan and return the completed report
    ///
    /// Units run strictly in plan order with no parallel dispatch. Every
    /// unit gets exactly one outcome; nothing is silently swallowed.
    pub async fn run(mut self) -> anyhow::Result<RunReport> {
        self.plan.validate()?;

        let units = self.plan.units.clone();
        let total = units.len();
        let mut report = RunReport::new();

        self.state.transition(RunState::Running)?;

        let mut halted: Option<String> = None;
        let mut aborted = false;

        for (index, unit) in units.iter().enumerate() {
            if halted.is_none() && !aborted && self.cancel.is_cancelled() {
                aborted = true;
                println!("\n🛑 Stop requested; no further units will start");
            }

            if let Some(ref reason) = halted {
                report.record(UnitOutcome::skipped(index, unit, reason.clone()));
                continue;
            }

            if aborted {
                report.record(UnitOutcome::skipped(
                    index,
                    unit,
                    "run aborted by operator".to_string(),
                ));
                continue;
            }

            println!(
                "\n📌 [{}/{}] {} {} → {}",
                index + 1,
                total,
                unit.package.name,
                unit.package.version,
                unit.registry
            );

            let started = Instant::now();
            let result = self.execute_unit(unit).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(ack) => {
                    println!("   ✅ Published {} v{} ({}ms)", ack.package, ack.version, duration_ms);
                    report.record(UnitOutcome::published(index, unit, duration_ms));
                }
                Err(failure) => {
                    let reason = failure.to_string();
                    println!("   ❌ {}", reason);
                    report.record(UnitOutcome::failed(index, unit, reason, duration_ms));

                    let policy = if self.options.continue_on_error {
                        FailurePolicy::Continue
                    } else {
                        unit.on_failure
                    };

                    if policy == FailurePolicy::Halt {
                        halted = Some(format!(
                            "earlier unit failed: {} → {}",
                            unit.package.name, unit.registry
                        ));
                        continue;
                    }
                }
            }

            // Settle before the next unit is allowed to start; skipped
            // once a stop has been requested, since no next unit will run
            if index + 1 < total && !self.cancel.is_cancelled() {
                self.settle(unit).await;
            }
        }

        let final_state = if aborted {
            RunState::Aborted
        } else if report.has_failures() {
            RunState::Failed
        } else {
            RunState::Succeeded
        };

        self.state.transition(final_state)?;
        report.finish(final_state);

        Ok(report)
    }

    /// Run one unit: authenticate, build if required, publish
    async fn execute_unit(&self, unit: &PublishUnit) -> Result<PublishAck, UnitFailure> {
        let registry_def = self.plan.registry_for(unit)?;

        let client = self
            .clients
            .get(&unit.registry)
            .ok_or_else(|| PlanError::UnknownRegistry {
                name: unit.registry.clone(),
            })?;

        let token = self.tokens.get_token(registry_def).ok_or_else(|| {
            RegistryError::AuthenticationFailed {
                registry: registry_def.name.clone(),
            }
        })?;

        client.authenticate(&token).await?;

        let artifact = match unit.build {
            Some(kind) => {
                let tool =
                    self.build_tools
                        .get(&kind)
                        .ok_or_else(|| PlanError::UnknownBuildKind {
                            name: kind.as_str().to_string(),
                        })?;

                println!("   🔨 Building with {}...", tool.name());
                tool.build(&unit.package).await?
            }
            None => ArtifactRef::source_tree(&unit.package.source_path),
        };

        println!("   📤 Publishing to {}...", client.name());
        let ack = self
            .retry
            .retry(
                || client.publish(&unit.package, &artifact, &token),
                RegistryError::is_retryable,
            )
            .await?;

        Ok(ack)
    }

    /// Wait out a unit's settle delay
    ///
    /// Registries that support the resolution probe are polled so the wait
    /// can end as soon as the version is visible; otherwise the full fixed
    /// delay elapses. Probe errors fall back to waiting out the delay.
    async fn settle(&self, unit: &PublishUnit) {
        let delay = unit.settle_delay;
        if delay.is_zero() {
            return;
        }

        let probing = self
            .clients
            .get(&unit.registry)
            .filter(|client| client.supports_resolution_probe());

        let Some(client) = probing else {
            println!("   ⏳ Waiting {:?} for registry propagation...", delay);
            tokio::time::sleep(delay).await;
            return;
        };

        println!(
            "   ⏳ Waiting for {} {} to become resolvable (up to {:?})...",
            unit.package.name, unit.package.version, delay
        );

        let deadline = tokio::time::Instant::now() + delay;
        loop {
            if let Ok(true) = client.is_resolvable(&unit.package).await {
                println!("   ✅ {} is resolvable", unit.package.name);
                return;
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return;
            }

            let step = self.options.settle_poll_interval.min(deadline - now);
            tokio::time::sleep(step).await;
        }
    }
}
