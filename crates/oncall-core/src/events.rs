//! Core events emitted by the controller

use chrono::{DateTime, Local};
use oncall_api::{EventPayload, Incident, Phase, ResolutionOutcome, SessionStats, SolutionType};
use oncall_util::{CompanyId, IncidentId, WorkdayId};

/// Events emitted by the workday controller
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// The state machine changed phase
    PhaseChanged { from: Phase, to: Phase },

    /// The service opened a workday
    WorkdayStarted {
        workday_id: WorkdayId,
        company_id: CompanyId,
        incidents_scheduled: u32,
        current_rating: i32,
    },

    /// The schedule clock was armed
    IncidentScheduled {
        next_incident_at: DateTime<Local>,
        delay_secs: u64,
    },

    /// A new incident became active
    IncidentArrived {
        incident: Incident,
        incident_number: u32,
    },

    /// The active incident was graded and cleared
    IncidentResolved {
        incident_id: IncidentId,
        solution_type: SolutionType,
        forced: bool,
        outcome: ResolutionOutcome,
    },

    /// The incident target was reached
    MonitoringEntered { incident_count: u32 },

    /// The service closed the workday
    WorkdayCompleted {
        workday_id: WorkdayId,
        stats: SessionStats,
    },

    /// A clock-triggered service call failed
    BackendFailed { operation: String, message: String },
}

impl From<CoreEvent> for EventPayload {
    fn from(event: CoreEvent) -> Self {
        match event {
            CoreEvent::PhaseChanged { from, to } => EventPayload::PhaseChanged { from, to },
            CoreEvent::WorkdayStarted {
                workday_id,
                company_id,
                incidents_scheduled,
                current_rating,
            } => EventPayload::WorkdayStarted {
                workday_id,
                company_id,
                incidents_scheduled,
                current_rating,
            },
            CoreEvent::IncidentScheduled {
                next_incident_at,
                delay_secs,
            } => EventPayload::IncidentScheduled {
                next_incident_at,
                delay_secs,
            },
            CoreEvent::IncidentArrived {
                incident,
                incident_number,
            } => EventPayload::IncidentArrived {
                incident,
                incident_number,
            },
            CoreEvent::IncidentResolved {
                incident_id,
                solution_type,
                forced,
                outcome,
            } => EventPayload::IncidentResolved {
                incident_id,
                solution_type,
                forced,
                outcome,
            },
            CoreEvent::MonitoringEntered { incident_count } => {
                EventPayload::MonitoringEntered { incident_count }
            }
            CoreEvent::WorkdayCompleted { workday_id, stats } => {
                EventPayload::WorkdayCompleted { workday_id, stats }
            }
            CoreEvent::BackendFailed { operation, message } => EventPayload::Error {
                message: format!("{} failed: {}", operation, message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_failure_becomes_error_event() {
        let payload: EventPayload = CoreEvent::BackendFailed {
            operation: "generate_incident".into(),
            message: "Network error: connection refused".into(),
        }
        .into();

        match payload {
            EventPayload::Error { message } => {
                assert_eq!(
                    message,
                    "generate_incident failed: Network error: connection refused"
                );
            }
            other => panic!("Expected Error, got {:?}", other),
        }
    }
}
