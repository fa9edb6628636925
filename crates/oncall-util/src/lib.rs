//! Shared utilities for oncall-sim
//!
//! This crate provides:
//! - ID types (WorkdayId, IncidentId, CompanyId)
//! - Time utilities (mockable wall clock, countdown formatting)
//! - Error types
//! - Default paths for the configuration file

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
