use serde::Deserialize;
use serde::Serialize;

use super::cluster::invalid;
use crate::Result;

/// Basic retry policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum number of attempts (must be at least 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single attempt timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds). Equal to `base_delay_ms`
    /// means a fixed delay between attempts.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_ms: default_op_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl BackoffPolicy {
    fn validate(
        &self,
        name: &str,
    ) -> Result<()> {
        if self.max_retries == 0 {
            return Err(invalid(format!("retry.{name}.max_retries must be at least 1")));
        }
        if self.timeout_ms == 0 {
            return Err(invalid(format!("retry.{name}.timeout_ms cannot be 0")));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(invalid(format!(
                "retry.{name}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }
}

/// Divide strategies by operation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryPolicies {
    // Primary discovery (absorbs mid-election states)
    #[serde(default = "default_primary_resolution")]
    pub primary_resolution: BackoffPolicy,

    // Workload schema provisioning on the baseline primary
    #[serde(default = "default_schema")]
    pub schema: BackoffPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            primary_resolution: default_primary_resolution(),
            schema: default_schema(),
        }
    }
}

impl RetryPolicies {
    pub fn validate(&self) -> Result<()> {
        self.primary_resolution.validate("primary_resolution")?;
        self.schema.validate("schema")?;
        Ok(())
    }
}

fn default_primary_resolution() -> BackoffPolicy {
    BackoffPolicy {
        max_retries: 3,
        timeout_ms: 5000,
        base_delay_ms: 200,
        max_delay_ms: 200,
    }
}
fn default_schema() -> BackoffPolicy {
    BackoffPolicy {
        max_retries: 3,
        timeout_ms: 5000,
        base_delay_ms: 500,
        max_delay_ms: 2000,
    }
}
fn default_max_retries() -> usize {
    3
}
fn default_op_timeout_ms() -> u64 {
    5000
}
fn default_base_delay_ms() -> u64 {
    200
}
fn default_max_delay_ms() -> u64 {
    200
}
