//! End-to-end failover scenario.
//!
//! [`FailoverController`] walks a [`ScenarioState`] machine: baseline check,
//! workload start, primary stop, election monitoring, recovery, workload
//! stop, statistics and convergence checks. Only a missing baseline primary
//! (and a schema that cannot be provisioned) ends a run early; every other
//! failure is observed and reported.

mod controller;
mod report;
mod state;
pub use controller::*;
pub use report::*;
pub use state::*;
