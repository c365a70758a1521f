use std::fmt;
use std::time::Duration;

use crate::utils::time::format_secs;
use crate::ConsistencyReport;
use crate::LagReport;
use crate::PayloadCheck;
use crate::RejoinOutcome;
use crate::ScenarioState;
use crate::StatsSnapshot;

/// What one election poll saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    NoPrimary,
    /// The stopped node is still reported as primary
    SamePrimary(String),
    NewPrimary(String),
}

impl fmt::Display for PollOutcome {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            PollOutcome::NoPrimary => write!(f, "no primary"),
            PollOutcome::SamePrimary(name) => write!(f, "same primary ({name})"),
            PollOutcome::NewPrimary(name) => write!(f, "new primary ({name})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionPoll {
    /// Since election monitoring started
    pub elapsed: Duration,
    pub outcome: PollOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionOutcome {
    /// A primary other than the stopped node was seen within the wait
    Elected(String),
    /// Only the final attempt after the wait found a primary, possibly the
    /// stopped node itself
    Stale(String),
    NoPrimary,
}

impl ElectionOutcome {
    pub fn primary(&self) -> Option<&str> {
        match self {
            ElectionOutcome::Elected(name) | ElectionOutcome::Stale(name) => Some(name.as_str()),
            ElectionOutcome::NoPrimary => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.primary().is_some()
    }
}

impl fmt::Display for ElectionOutcome {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ElectionOutcome::Elected(name) => write!(f, "elected {name}"),
            ElectionOutcome::Stale(name) => write!(f, "{name} found after the wait expired"),
            ElectionOutcome::NoPrimary => write!(f, "NO PRIMARY ELECTED"),
        }
    }
}

/// Everything one scenario run observed.
#[derive(Debug, Clone)]
pub struct FinalReport {
    pub run_id: String,
    pub baseline_primary: String,
    pub election: ElectionOutcome,
    pub polls: Vec<ElectionPoll>,
    /// Primary resolved after the run settled
    pub final_primary: Option<String>,
    pub rejoin: Result<RejoinOutcome, String>,
    /// From stopping the primary to the workload's first unresolvable write
    pub detection_delay: Option<Duration>,
    pub workload: StatsSnapshot,
    pub consistency: ConsistencyReport,
    pub payload: Option<PayloadCheck>,
    pub lag: Option<LagReport>,
    pub path: Vec<ScenarioState>,
}

impl FinalReport {
    pub fn success_rate(&self) -> Option<f64> {
        self.workload.success_rate()
    }

    pub fn failover_duration(&self) -> Option<Duration> {
        self.workload.failover_duration()
    }

    pub fn lost_writes(&self) -> u64 {
        self.workload.lost_writes()
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency.is_consistent() && self.payload.as_ref().map_or(true, PayloadCheck::all_match)
    }

    pub fn visited(
        &self,
        state: ScenarioState,
    ) -> bool {
        self.path.contains(&state)
    }
}

fn or_na(d: Option<Duration>) -> String {
    d.map(format_secs).unwrap_or_else(|| "n/a".to_string())
}

impl fmt::Display for FinalReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let w = &self.workload;
        let rate = match self.success_rate() {
            Some(rate) => format!("{rate:.2}%"),
            None => "n/a".to_string(),
        };

        writeln!(f, "Failover drill {}", self.run_id)?;
        writeln!(f, "  baseline primary: {}", self.baseline_primary)?;
        writeln!(f, "  election: {}", self.election)?;
        for poll in &self.polls {
            writeln!(f, "    +{}: {}", format_secs(poll.elapsed), poll.outcome)?;
        }
        writeln!(f, "  final primary: {}", self.final_primary.as_deref().unwrap_or("none"))?;
        match &self.rejoin {
            Ok(RejoinOutcome::Joined) => writeln!(f, "  rejoin: joined")?,
            Ok(RejoinOutcome::AlreadyJoined) => writeln!(f, "  rejoin: already joined")?,
            Err(e) => writeln!(f, "  rejoin: failed ({e})")?,
        }

        writeln!(f, "Workload")?;
        writeln!(f, "  attempts: {}", w.total_attempts)?;
        writeln!(f, "  successful: {}/{}", w.successful_inserts, w.total_attempts)?;
        writeln!(f, "  failed: {}", w.failed_inserts)?;
        writeln!(f, "  success rate: {rate}")?;
        writeln!(f, "  failover duration: {}", or_na(self.failover_duration()))?;
        writeln!(f, "  detection delay: {}", or_na(self.detection_delay))?;
        writeln!(f, "  lost writes: {}", self.lost_writes())?;
        for (kind, count) in &w.errors {
            writeln!(f, "    {kind}: {count}")?;
        }

        writeln!(f, "Consistency")?;
        writeln!(f, "{}", self.consistency)?;
        if let Some(lag) = &self.lag {
            writeln!(f, "{lag}")?;
        }
        if let Some(payload) = &self.payload {
            writeln!(f, "{payload}")?;
        }

        let path: Vec<&str> = self.path.iter().map(ScenarioState::as_str).collect();
        write!(f, "States: {}", path.join(" -> "))
    }
}
