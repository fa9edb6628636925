//! Simulation service interface for oncall-sim
//!
//! This crate defines the contract between the workday controller and the
//! remote simulation service. It contains no transport code itself; see
//! `oncall-http` for the HTTP binding.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
