use std::fmt;

use tracing::debug;

use crate::ScenarioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioState {
    Idle,
    BaselineChecked,
    WorkloadRunning,
    FailureInjected,
    ElectionPending,
    NewPrimaryConfirmed,
    TimedOut,
    Recovering,
    Settled,
    Reported,
    Done,
}

impl ScenarioState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioState::Idle => "Idle",
            ScenarioState::BaselineChecked => "BaselineChecked",
            ScenarioState::WorkloadRunning => "WorkloadRunning",
            ScenarioState::FailureInjected => "FailureInjected",
            ScenarioState::ElectionPending => "ElectionPending",
            ScenarioState::NewPrimaryConfirmed => "NewPrimaryConfirmed",
            ScenarioState::TimedOut => "TimedOut",
            ScenarioState::Recovering => "Recovering",
            ScenarioState::Settled => "Settled",
            ScenarioState::Reported => "Reported",
            ScenarioState::Done => "Done",
        }
    }

    pub fn can_transition_to(
        &self,
        next: ScenarioState,
    ) -> bool {
        use ScenarioState::*;
        matches!(
            (self, next),
            (Idle, BaselineChecked)
                | (BaselineChecked, WorkloadRunning)
                | (WorkloadRunning, FailureInjected)
                | (FailureInjected, ElectionPending)
                | (ElectionPending, NewPrimaryConfirmed)
                | (ElectionPending, TimedOut)
                | (NewPrimaryConfirmed, Recovering)
                | (TimedOut, Recovering)
                | (Recovering, Settled)
                | (Settled, Reported)
                | (Reported, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == ScenarioState::Done
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus every state visited, starting at `Idle`.
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: ScenarioState,
    path: Vec<ScenarioState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            current: ScenarioState::Idle,
            path: vec![ScenarioState::Idle],
        }
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ScenarioState {
        self.current
    }

    pub fn path(&self) -> &[ScenarioState] {
        &self.path
    }

    pub fn visited(
        &self,
        state: ScenarioState,
    ) -> bool {
        self.path.contains(&state)
    }

    pub fn transition(
        &mut self,
        next: ScenarioState,
    ) -> Result<(), ScenarioError> {
        if !self.current.can_transition_to(next) {
            return Err(ScenarioError::InvalidTransition {
                from: self.current.as_str(),
                to: next.as_str(),
            });
        }
        debug!(from = %self.current, to = %next, "scenario transition");
        self.current = next;
        self.path.push(next);
        Ok(())
    }
}
