//! Configuration management for the failover drill.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod cluster;
mod lifecycle;
mod observability;
mod retry;
mod scenario;
mod simulation;
mod workload;
pub use cluster::*;
pub use lifecycle::*;
pub use observability::*;
pub use retry::*;
pub use scenario::*;
pub use simulation::*;
pub use workload::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment prefix for overrides, e.g. `FAILOVER__SCENARIO__WARMUP_SECS=3`
pub const ENV_PREFIX: &str = "FAILOVER";

/// Main configuration container
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Node registry
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Retry policies for discovery and provisioning
    #[serde(default)]
    pub retry: RetryPolicies,
    /// Scenario timings
    #[serde(default)]
    pub scenario: ScenarioConfig,
    /// Write workload parameters
    #[serde(default)]
    pub workload: WorkloadConfig,
    /// In-process cluster behaviour
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Container tooling
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Debug for Settings {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("cluster", &self.cluster)
            .field("scenario", &self.scenario)
            .finish()
    }
}

impl Settings {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so further overrides can be layered with
    /// [`with_override_config`](Self::with_override_config). Callers MUST call
    /// [`validate`](Self::validate) before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/drill.toml");
    /// std::env::set_var("FAILOVER__SCENARIO__WARMUP_SECS", "3");
    /// let settings = Settings::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.cluster.validate()?;
        self.retry.validate()?;
        self.scenario.validate()?;
        self.workload.validate()?;
        self.lifecycle.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
