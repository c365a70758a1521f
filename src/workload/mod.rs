//! Concurrent write workload.
//!
//! [`WorkloadDriver`] writes to whatever node currently holds the primary
//! role and records every attempt in a shared [`WorkloadStats`]. The gap
//! during which no primary can be resolved is its [`FailoverWindow`].

mod driver;
mod stats;
pub use driver::*;
pub use stats::*;
