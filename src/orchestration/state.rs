//! Run state machine for release orchestration
//!
//! A run moves NotStarted → Running → one terminal state. Transitions are
//! validated and recorded with timestamps so a run's trajectory can be
//! inspected after the fact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Release run state
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Aborted,
}

impl RunState {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed | RunState::Aborted)
    }
}

/// State machine errors
#[derive(Error, Debug)]
pub enum StateError {
    #[error("invalid run state transition: {from:?} → {to:?}")]
    InvalidTransition { from: RunState, to: RunState },
}

/// State transition record
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StateTransition {
    pub from: RunState,
    pub to: RunState,
    pub timestamp: DateTime<Utc>,
}

/// State machine tracking one release run
pub struct RunStateMachine {
    current_state: RunState,
    transitions: Vec<StateTransition>,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateMachine {
    /// Create a new state machine in `NotStarted`
    pub fn new() -> Self {
        Self {
            current_state: RunState::NotStarted,
            transitions: Vec::new(),
        }
    }

    /// Get current state
    pub fn state(&self) -> RunState {
        self.current_state
    }

    /// Transition to a new state, rejecting anything the run lifecycle
    /// does not allow
    pub fn transition(&mut self, to: RunState) -> Result<(), StateError> {
        let allowed = matches!(
            (self.current_state, to),
            (RunState::NotStarted, RunState::Running)
                | (RunState::Running, RunState::Succeeded)
                | (RunState::Running, RunState::Failed)
                | (RunState::Running, RunState::Aborted)
        );

        if !allowed {
            return Err(StateError::InvalidTransition {
                from: self.current_state,
                to,
            });
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
        });
        self.current_state = to;

        Ok(())
    }

    /// Get transition history as human-readable string
    pub fn history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| format!("{}: {:?} → {:?}", t.timestamp.to_rfc3339(), t.from, t.to))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_machine() {
        let machine = RunStateMachine::new();
        assert_eq!(machine.state(), RunState::NotStarted);
        assert!(!machine.state().is_terminal());
    }

    #[test]
    fn test_full_successful_lifecycle() {
        let mut machine = RunStateMachine::new();
        machine.transition(RunState::Running).unwrap();
        machine.transition(RunState::Succeeded).unwrap();

        assert_eq!(machine.state(), RunState::Succeeded);
        assert!(machine.state().is_terminal());
    }

    #[test]
    fn test_running_to_failed() {
        let mut machine = RunStateMachine::new();
        machine.transition(RunState::Running).unwrap();
        machine.transition(RunState::Failed).unwrap();
        assert_eq!(machine.state(), RunState::Failed);
    }

    #[test]
    fn test_running_to_aborted() {
        let mut machine = RunStateMachine::new();
        machine.transition(RunState::Running).unwrap();
        machine.transition(RunState::Aborted).unwrap();
        assert_eq!(machine.state(), RunState::Aborted);
    }

    #[test]
    fn test_rejects_skipping_running() {
        let mut machine = RunStateMachine::new();
        let result = machine.transition(RunState::Succeeded);
        assert!(matches!(result, Err(StateError::InvalidTransition { .. })));
        assert_eq!(machine.state(), RunState::NotStarted);
    }

    #[test]
    fn test_rejects_leaving_terminal_state() {
        let mut machine = RunStateMachine::new();
        machine.transition(RunState::Running).unwrap();
        machine.transition(RunState::Failed).unwrap();

        let result = machine.transition(RunState::Running);
        assert!(matches!(result, Err(StateError::InvalidTransition { .. })));
    }

    #[test]
    fn test_history_records_transitions() {
        let mut machine = RunStateMachine::new();
        machine.transition(RunState::Running).unwrap();
        machine.transition(RunState::Succeeded).unwrap();

        let history = machine.history();
        assert!(history.contains("NotStarted → Running"));
        assert!(history.contains("Running → Succeeded"));
    }
}
