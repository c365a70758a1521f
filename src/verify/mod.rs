//! Post-run convergence checks.
//!
//! Row counts are compared across every registered node. The stricter
//! payload check reads one known row back from each node and compares it
//! byte for byte, which catches truncation a count cannot see.

mod payload;
mod report;
mod verifier;
pub use payload::*;
pub use report::*;
pub use verifier::*;
