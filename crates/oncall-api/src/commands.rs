//! Command types for the oncall-sim driver protocol
//!
//! Hosts write one JSON command per line to the driver's stdin.

use oncall_util::CompanyId;
use serde::{Deserialize, Serialize};

use crate::{Severity, SolutionType};

/// All commands a host can send to the driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Emit a full state snapshot
    GetState,

    /// Start a workday. Falls back to the configured company when omitted.
    Start {
        #[serde(default)]
        company_id: Option<CompanyId>,
    },

    /// Submit a resolution for the active incident
    Resolve {
        resolution_approach: String,
        #[serde(default)]
        solution_type: SolutionType,
        #[serde(default = "default_true")]
        was_successful: bool,
        #[serde(default)]
        code_changes: String,
        #[serde(default)]
        commands_executed: Vec<String>,
    },

    /// Give up on the active incident (unsuccessful escalation)
    Escalate {
        #[serde(default)]
        resolution_approach: String,
    },

    /// Skip the remaining wait and generate the next incident now.
    /// Severity and time of day are optional hints for the generator.
    GenerateNow {
        #[serde(default)]
        severity: Option<Severity>,
        #[serde(default)]
        time_of_day: Option<String>,
    },

    /// End the workday (only while monitoring)
    EndDay,

    /// Stop the driver
    Quit,
}

fn default_true() -> bool {
    true
}

impl Command {
    /// Stable name for logging and rejection events
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetState => "get_state",
            Command::Start { .. } => "start",
            Command::Resolve { .. } => "resolve",
            Command::Escalate { .. } => "escalate",
            Command::GenerateNow { .. } => "generate_now",
            Command::EndDay => "end_day",
            Command::Quit => "quit",
        }
    }
}
