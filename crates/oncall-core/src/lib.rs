//! Incident scheduling and workday state machine for oncall-sim
//!
//! This crate is the heart of oncall-sim, containing:
//! - Wait-time sampling between incidents
//! - The incident countdown and the wall-clock schedule countdown
//! - Workday state machine (Idle -> Waiting -> Active -> Waiting/Monitoring -> Completed)

mod clock;
mod controller;
mod events;
mod sampler;

pub use clock::*;
pub use controller::*;
pub use events::*;
pub use sampler::*;
