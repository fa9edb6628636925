//! Shared types for the oncall-sim API

use chrono::{DateTime, Local};
use oncall_util::{CompanyId, IncidentId, WorkdayId};
use serde::{Deserialize, Serialize};

/// Incident count target used when the service does not supply one
pub const DEFAULT_INCIDENTS_SCHEDULED: u32 = 8;

/// Rating shown before the service reports one
pub const DEFAULT_RATING: i32 = 800;

/// Phase of the workday state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session started yet
    Idle,
    /// Waiting for the next scheduled incident
    Waiting,
    /// An incident is in progress
    Active,
    /// Quota reached; incidents keep arriving until the user ends the day
    Monitoring,
    /// Workday finished (terminal)
    Completed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed)
    }

    /// Phases in which the schedule clock drives the next incident
    pub fn awaits_incident(&self) -> bool {
        matches!(self, Phase::Waiting | Phase::Monitoring)
    }
}

/// Incident severity, P0 (most severe) through P3
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    P0,
    P1,
    P2,
    P3,
    Unknown(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::P0 => "P0",
            Severity::P1 => "P1",
            Severity::P2 => "P2",
            Severity::P3 => "P3",
            Severity::Unknown(s) => s,
        }
    }

    /// Human-readable impact label
    pub fn label(&self) -> &'static str {
        match self {
            Severity::P0 => "Critical - Service Down",
            Severity::P1 => "High - Major Impact",
            Severity::P2 => "Medium - Minor Impact",
            Severity::P3 => "Low - Cosmetic Issue",
            Severity::Unknown(_) => "Unknown",
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "P0" => Severity::P0,
            "P1" => Severity::P1,
            "P2" => Severity::P2,
            "P3" => Severity::P3,
            _ => Severity::Unknown(s),
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.as_str().to_string()
    }
}

/// How the user chose to handle an incident
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionType {
    RootCause,
    #[default]
    Workaround,
    Escalation,
    Abandonment,
}

/// Final status of an incident as reported by the grading service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IncidentStatus {
    Resolved,
    Escalated,
    Abandoned,
    Other(String),
}

impl IncidentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Escalated => "escalated",
            IncidentStatus::Abandoned => "abandoned",
            IncidentStatus::Other(other) => other,
        }
    }
}

impl From<String> for IncidentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "resolved" => IncidentStatus::Resolved,
            "escalated" => IncidentStatus::Escalated,
            "abandoned" => IncidentStatus::Abandoned,
            _ => IncidentStatus::Other(s),
        }
    }
}

impl From<IncidentStatus> for String {
    fn from(s: IncidentStatus) -> Self {
        match s {
            IncidentStatus::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

/// Skill tier derived from a numeric rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingTier {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl RatingTier {
    pub fn from_rating(rating: i32) -> Self {
        match rating {
            r if r >= 1400 => RatingTier::Expert,
            r if r >= 1200 => RatingTier::Advanced,
            r if r >= 1000 => RatingTier::Intermediate,
            r if r >= 800 => RatingTier::Beginner,
            _ => RatingTier::Novice,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingTier::Novice => "Novice",
            RatingTier::Beginner => "Beginner",
            RatingTier::Intermediate => "Intermediate",
            RatingTier::Advanced => "Advanced",
            RatingTier::Expert => "Expert",
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation service payloads
// ---------------------------------------------------------------------------

/// Workday session as returned by the service's start operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkdaySession {
    pub id: WorkdayId,
    pub company_id: CompanyId,
    /// Target incident count; callers fall back to a default when absent
    #[serde(default)]
    pub incidents_scheduled: Option<u32>,
    #[serde(default = "default_rating")]
    pub current_rating: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_rating() -> i32 {
    DEFAULT_RATING
}

fn default_true() -> bool {
    true
}

/// Request body for incident generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRequest {
    pub company_id: CompanyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

impl IncidentRequest {
    pub fn for_company(company_id: CompanyId) -> Self {
        Self {
            company_id,
            severity: None,
            time_of_day: None,
        }
    }

    pub fn with_severity(mut self, severity: Option<Severity>) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_time_of_day(mut self, time_of_day: Option<String>) -> Self {
        self.time_of_day = time_of_day;
        self
    }
}

/// A generated incident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: IncidentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub affected_services: Vec<String>,
    #[serde(default)]
    pub error_logs: String,
    #[serde(default)]
    pub codebase_context: String,
    #[serde(default)]
    pub monitoring_dashboard_url: Option<String>,
}

impl Incident {
    pub fn time_limit_seconds(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }
}

/// Resolution submitted for grading. Serialized with camelCase keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRequest {
    pub incident_id: IncidentId,
    pub resolution_approach: String,
    #[serde(default)]
    pub code_changes: String,
    #[serde(default)]
    pub commands_executed: Vec<String>,
    pub solution_type: SolutionType,
    pub was_successful: bool,
}

/// Grading feedback attached to a resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grading {
    pub score: f64,
    pub feedback: String,
    #[serde(default)]
    pub grading_method: String,
}

/// Result of a graded resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub incident_status: IncidentStatus,
    pub new_overall_rating: i32,
    pub rating_change: i32,
    #[serde(default)]
    pub time_spent_minutes: f64,
    #[serde(default)]
    pub incident_resolved: bool,
    #[serde(default)]
    pub attempt_id: Option<String>,
    #[serde(default, alias = "groq_grading")]
    pub grading: Option<Grading>,
}

/// Company persona
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub company_size: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

/// Aggregate statistics attached to a user rating
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingStatistics {
    #[serde(default)]
    pub total_incidents_resolved: u32,
    #[serde(default)]
    pub average_resolution_time: f64,
    #[serde(default)]
    pub success_rate: f64,
}

/// The user's overall rating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRating {
    pub overall_rating: i32,
    #[serde(default)]
    pub rating_category: Option<String>,
    #[serde(default)]
    pub rating_percentile: Option<f64>,
    #[serde(default)]
    pub points_to_next_category: Option<i32>,
    #[serde(default)]
    pub statistics: RatingStatistics,
}

impl UserRating {
    pub fn tier(&self) -> RatingTier {
        RatingTier::from_rating(self.overall_rating)
    }
}

// ---------------------------------------------------------------------------
// Driver state exposed to hosts
// ---------------------------------------------------------------------------

/// Per-session tally of finished incidents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub resolved: u32,
    pub escalated: u32,
    pub abandoned: u32,
}

impl SessionStats {
    /// Record one finished incident by its reported status
    pub fn record(&mut self, status: &IncidentStatus) {
        match status {
            IncidentStatus::Resolved => self.resolved += 1,
            IncidentStatus::Escalated => self.escalated += 1,
            IncidentStatus::Abandoned | IncidentStatus::Other(_) => self.abandoned += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.resolved + self.escalated + self.abandoned
    }
}

/// The active incident as shown to hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentView {
    pub incident_id: IncidentId,
    pub title: String,
    pub severity: Severity,
    pub time_limit_minutes: u32,
    pub affected_services: Vec<String>,
    /// Seconds left before forced escalation; None once the clock has fired
    pub time_remaining_secs: Option<u64>,
}

/// Full snapshot of the workday state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkdaySnapshot {
    pub api_version: u32,
    pub phase: Phase,
    pub workday_id: Option<WorkdayId>,
    pub company_id: Option<CompanyId>,
    pub incident_count: u32,
    pub incidents_scheduled: u32,
    pub current_rating: i32,
    pub current_incident: Option<IncidentView>,
    pub next_incident_at: Option<DateTime<Local>>,
    pub next_incident_in_secs: Option<u64>,
    pub stats: SessionStats,
    pub last_outcome: Option<ResolutionOutcome>,
    pub resolving: bool,
}
