//! Failover drill for single-primary replication groups.
//!
//! The crate resolves the current primary, keeps a write workload running
//! against it, stops the primary, measures how long writes are impossible,
//! watches for the election of a new primary, restarts the old one and
//! finally checks that every member converged to the same data.
//!
//! - [`FailoverController`] runs the scenario end to end
//! - [`WorkloadDriver`] is the concurrent write generator
//! - [`PrimaryResolver`] and [`TopologyProber`] discover the topology
//! - [`ConsistencyVerifier`] compares what the members hold
//!
//! Nodes are reached through the [`NodeClient`] and [`NodeLifecycle`]
//! traits. [`SimulatedCluster`] implements both in process;
//! [`ContainerLifecycle`] drives docker-compose deployments.

mod client;
mod cluster;
mod config;
mod errors;
mod lifecycle;
mod scenario;
mod sim;
mod topology;
mod verify;
mod workload;

pub mod constants;
pub mod utils;

pub use client::*;
pub use cluster::*;
pub use config::*;
pub use errors::*;
pub use lifecycle::*;
pub use scenario::*;
pub use sim::*;
pub use topology::*;
pub use verify::*;
pub use workload::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
