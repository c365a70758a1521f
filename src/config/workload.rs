use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::cluster::invalid;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkloadConfig {
    /// Pause between two write attempts
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Emit a progress line every N attempts (0 disables it)
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,

    #[serde(default)]
    pub payload_check: PayloadCheckConfig,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            progress_every: default_progress_every(),
            payload_check: PayloadCheckConfig::default(),
        }
    }
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(invalid("workload.interval_ms cannot be 0"));
        }
        self.payload_check.validate()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Larger-payload scenario: one random row written at baseline and
/// byte-compared on every node after the run settles.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PayloadCheckConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_size_bytes")]
    pub size_bytes: usize,

    /// How long each secondary is polled for the payload row
    #[serde(default = "default_lag_timeout_ms")]
    pub lag_timeout_ms: u64,

    #[serde(default = "default_lag_poll_interval_ms")]
    pub lag_poll_interval_ms: u64,
}

impl Default for PayloadCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size_bytes: default_size_bytes(),
            lag_timeout_ms: default_lag_timeout_ms(),
            lag_poll_interval_ms: default_lag_poll_interval_ms(),
        }
    }
}

impl PayloadCheckConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.size_bytes == 0 {
            return Err(invalid("workload.payload_check.size_bytes cannot be 0"));
        }
        if self.lag_poll_interval_ms == 0 {
            return Err(invalid("workload.payload_check.lag_poll_interval_ms cannot be 0"));
        }
        Ok(())
    }

    pub fn lag_timeout(&self) -> Duration {
        Duration::from_millis(self.lag_timeout_ms)
    }

    pub fn lag_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lag_poll_interval_ms)
    }
}

fn default_interval_ms() -> u64 {
    500
}
fn default_progress_every() -> u64 {
    10
}
fn default_size_bytes() -> usize {
    5000
}
fn default_lag_timeout_ms() -> u64 {
    10_000
}
fn default_lag_poll_interval_ms() -> u64 {
    1
}
