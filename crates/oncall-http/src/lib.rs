//! HTTP binding of the simulation service for oncall-sim
//!
//! Provides:
//! - JSON requests against the simulation REST API
//! - Bearer-token authentication with login and refresh-on-401

mod auth;
mod client;

pub use auth::*;
pub use client::*;
