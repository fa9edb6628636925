//! Protocol types for oncall-sim
//!
//! This crate defines:
//! - Payloads exchanged with the remote simulation service
//! - Commands accepted by the driver (host UI -> driver)
//! - Events streamed by the driver (driver -> host UI)
//! - Versioning

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
