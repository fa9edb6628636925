//! Event types for driver -> host streaming

use chrono::{DateTime, Local};
use oncall_util::{CompanyId, IncidentId, WorkdayId};
use serde::{Deserialize, Serialize};

use crate::{
    Incident, Phase, ResolutionOutcome, SessionStats, SolutionType, WorkdaySnapshot, API_VERSION,
};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: oncall_util::now(),
            payload,
        }
    }
}

/// All events the driver emits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot (on request and after major changes)
    StateChanged(WorkdaySnapshot),

    /// The state machine moved between phases
    PhaseChanged { from: Phase, to: Phase },

    /// The service accepted a new workday
    WorkdayStarted {
        workday_id: WorkdayId,
        company_id: CompanyId,
        incidents_scheduled: u32,
        current_rating: i32,
    },

    /// The next incident has been scheduled
    IncidentScheduled {
        next_incident_at: DateTime<Local>,
        delay_secs: u64,
    },

    /// A new incident is active
    IncidentArrived {
        incident: Incident,
        incident_number: u32,
    },

    /// An incident was graded
    IncidentResolved {
        incident_id: IncidentId,
        solution_type: SolutionType,
        /// True when the incident timed out and was escalated automatically
        forced: bool,
        outcome: ResolutionOutcome,
    },

    /// The scheduled quota is done; incidents keep coming until end of day
    MonitoringEntered { incident_count: u32 },

    /// The workday was closed with the service
    WorkdayCompleted {
        workday_id: WorkdayId,
        stats: SessionStats,
    },

    /// A command was not applicable in the current state
    CommandRejected { command: String, reason: String },

    /// A command or service call failed
    Error { message: String },

    /// The driver is shutting down
    Shutdown,
}
