//! Domain models for stark-vip
//!
//! Proof requests and artifacts on the prover side, artifact paths, calldata
//! and verification results on the relay side.

mod proof;
mod verification;

pub use proof::*;
pub use verification::*;
