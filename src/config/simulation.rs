use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Behaviour of the in-process replication group used by the binary and tests.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Time between losing the primary and the group electing a new one
    #[serde(default = "default_election_delay_ms")]
    pub election_delay_ms: u64,

    /// How long a joining member stays RECOVERING
    #[serde(default = "default_recovery_delay_ms")]
    pub recovery_delay_ms: u64,

    /// Restarted members join the group on their own
    #[serde(default)]
    pub auto_rejoin: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            election_delay_ms: default_election_delay_ms(),
            recovery_delay_ms: default_recovery_delay_ms(),
            auto_rejoin: false,
        }
    }
}

impl SimulationConfig {
    pub fn election_delay(&self) -> Duration {
        Duration::from_millis(self.election_delay_ms)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }
}

fn default_election_delay_ms() -> u64 {
    5000
}
fn default_recovery_delay_ms() -> u64 {
    2000
}
