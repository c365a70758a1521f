use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::cluster::invalid;
use crate::Result;

/// Timings of the scripted failover scenario.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScenarioConfig {
    /// Steady-state workload before the primary is stopped
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,

    /// Pause between stopping the primary and the first election poll
    #[serde(default = "default_pre_election_settle_secs")]
    pub pre_election_settle_secs: u64,

    #[serde(default = "default_election_poll_interval_ms")]
    pub election_poll_interval_ms: u64,

    /// Hard ceiling on election polling
    #[serde(default = "default_election_max_wait_secs")]
    pub election_max_wait_secs: u64,

    #[serde(default = "default_post_election_settle_secs")]
    pub post_election_settle_secs: u64,

    /// Workload time on the new primary before the old one is recovered
    #[serde(default = "default_post_failover_workload_secs")]
    pub post_failover_workload_secs: u64,

    /// Process readiness wait after the stopped node is started again
    #[serde(default = "default_startup_wait_secs")]
    pub startup_wait_secs: u64,

    /// Wait after the rejoin attempt so distributed recovery can finish
    #[serde(default = "default_rejoin_wait_secs")]
    pub rejoin_wait_secs: u64,

    /// Grace period for the in-flight workload iteration after cancellation
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,

    /// Replication drain before consistency verification
    #[serde(default = "default_consistency_settle_secs")]
    pub consistency_settle_secs: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            warmup_secs: default_warmup_secs(),
            pre_election_settle_secs: default_pre_election_settle_secs(),
            election_poll_interval_ms: default_election_poll_interval_ms(),
            election_max_wait_secs: default_election_max_wait_secs(),
            post_election_settle_secs: default_post_election_settle_secs(),
            post_failover_workload_secs: default_post_failover_workload_secs(),
            startup_wait_secs: default_startup_wait_secs(),
            rejoin_wait_secs: default_rejoin_wait_secs(),
            stop_grace_ms: default_stop_grace_ms(),
            consistency_settle_secs: default_consistency_settle_secs(),
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        if self.election_poll_interval_ms == 0 {
            return Err(invalid("scenario.election_poll_interval_ms cannot be 0"));
        }
        if self.election_max_wait_secs == 0 {
            return Err(invalid("scenario.election_max_wait_secs cannot be 0"));
        }
        if Duration::from_millis(self.election_poll_interval_ms) > self.election_max_wait() {
            return Err(invalid(
                "scenario.election_poll_interval_ms must not exceed election_max_wait_secs",
            ));
        }
        Ok(())
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }
    pub fn pre_election_settle(&self) -> Duration {
        Duration::from_secs(self.pre_election_settle_secs)
    }
    pub fn election_poll_interval(&self) -> Duration {
        Duration::from_millis(self.election_poll_interval_ms)
    }
    pub fn election_max_wait(&self) -> Duration {
        Duration::from_secs(self.election_max_wait_secs)
    }
    pub fn post_election_settle(&self) -> Duration {
        Duration::from_secs(self.post_election_settle_secs)
    }
    pub fn post_failover_workload(&self) -> Duration {
        Duration::from_secs(self.post_failover_workload_secs)
    }
    pub fn startup_wait(&self) -> Duration {
        Duration::from_secs(self.startup_wait_secs)
    }
    pub fn rejoin_wait(&self) -> Duration {
        Duration::from_secs(self.rejoin_wait_secs)
    }
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
    pub fn consistency_settle(&self) -> Duration {
        Duration::from_secs(self.consistency_settle_secs)
    }
}

fn default_warmup_secs() -> u64 {
    10
}
fn default_pre_election_settle_secs() -> u64 {
    3
}
fn default_election_poll_interval_ms() -> u64 {
    2000
}
fn default_election_max_wait_secs() -> u64 {
    60
}
fn default_post_election_settle_secs() -> u64 {
    2
}
fn default_post_failover_workload_secs() -> u64 {
    10
}
fn default_startup_wait_secs() -> u64 {
    10
}
fn default_rejoin_wait_secs() -> u64 {
    15
}
fn default_stop_grace_ms() -> u64 {
    1000
}
fn default_consistency_settle_secs() -> u64 {
    5
}
