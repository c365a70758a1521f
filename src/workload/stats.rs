use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::constants::NO_PRIMARY_ERROR;

/// Interval during which the workload could not resolve any primary.
///
/// At most one window is tracked per run: `detected_at` is set by the first
/// unresolvable iteration, `completed_at` by the first later iteration that
/// resolves a primary again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailoverWindow {
    pub detected_at: Option<Instant>,
    pub completed_at: Option<Instant>,
}

impl FailoverWindow {
    /// Returns true only for the call that opened the window.
    pub fn mark_detected(
        &mut self,
        now: Instant,
    ) -> bool {
        if self.detected_at.is_some() {
            return false;
        }
        self.detected_at = Some(now);
        true
    }

    /// Closes an open window; returns its duration on the closing call only.
    pub fn mark_completed(
        &mut self,
        now: Instant,
    ) -> Option<Duration> {
        match (self.detected_at, self.completed_at) {
            (Some(detected), None) => {
                let now = now.max(detected);
                self.completed_at = Some(now);
                Some(now - detected)
            }
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.detected_at.is_some() && self.completed_at.is_none()
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.detected_at, self.completed_at) {
            (Some(detected), Some(completed)) => Some(completed.saturating_duration_since(detected)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    total_attempts: u64,
    successful_inserts: u64,
    failed_inserts: u64,
    errors: BTreeMap<String, u64>,
    window: FailoverWindow,
}

/// Aggregate shared between the workload driver (sole writer) and the
/// controller (reader). Counters only ever grow within a run.
///
/// Reads while the driver is active are progress snapshots and may trail
/// the in-flight iteration; final numbers are read after the driver stops.
#[derive(Debug, Default)]
pub struct WorkloadStats {
    inner: Mutex<Counters>,
}

/// Point-in-time copy of [`WorkloadStats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub total_attempts: u64,
    pub successful_inserts: u64,
    pub failed_inserts: u64,
    pub errors: BTreeMap<String, u64>,
    pub window: FailoverWindow,
}

impl StatsSnapshot {
    /// Percentage of successful attempts; `None` when nothing was attempted.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_attempts == 0 {
            return None;
        }
        Some(self.successful_inserts as f64 / self.total_attempts as f64 * 100.0)
    }

    /// Writes lost to any error, including the no-primary gap.
    pub fn lost_writes(&self) -> u64 {
        self.errors.values().sum()
    }

    pub fn failover_duration(&self) -> Option<Duration> {
        self.window.duration()
    }
}

impl WorkloadStats {
    pub fn new() -> Self {
        Self::default()
    }

    // Each record_* call commits a whole attempt (total plus its outcome)
    // under one lock, so `successful + failed == total` holds for every
    // snapshot, including ones taken mid-run.

    pub(crate) fn record_success(&self) -> StatsSnapshot {
        let mut inner = self.inner.lock();
        inner.total_attempts += 1;
        inner.successful_inserts += 1;
        inner.to_snapshot()
    }

    pub(crate) fn record_failure(
        &self,
        kind: &str,
    ) {
        let mut inner = self.inner.lock();
        inner.total_attempts += 1;
        inner.failed_inserts += 1;
        *inner.errors.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Counts a no-primary failure and opens the failover window if it is
    /// not open yet. Returns true when this call opened it.
    pub(crate) fn record_no_primary(
        &self,
        now: Instant,
    ) -> bool {
        let mut inner = self.inner.lock();
        inner.total_attempts += 1;
        inner.failed_inserts += 1;
        *inner.errors.entry(NO_PRIMARY_ERROR.to_string()).or_insert(0) += 1;
        inner.window.mark_detected(now)
    }

    /// Closes the failover window if one is open.
    pub(crate) fn record_primary_resolved(
        &self,
        now: Instant,
    ) -> Option<Duration> {
        self.inner.lock().window.mark_completed(now)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().to_snapshot()
    }
}

impl Counters {
    fn to_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_attempts: self.total_attempts,
            successful_inserts: self.successful_inserts,
            failed_inserts: self.failed_inserts,
            errors: self.errors.clone(),
            window: self.window,
        }
    }
}
