//! Topology discovery.
//!
//! - [`TopologyProber`] asks nodes, in registry order, for their view of the
//!   group; the first node that returns a non-empty membership table wins.
//!   Other nodes are not consulted for a second opinion, so during a
//!   split-brain the answer is whatever the first responder believes.
//! - [`PrimaryResolver`] wraps the prober with a bounded retry so a probe
//!   that lands mid-election does not read as a full cluster failure.

mod prober;
mod resolver;
pub use prober::*;
pub use resolver::*;
