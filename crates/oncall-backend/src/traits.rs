//! Simulation backend trait

use async_trait::async_trait;
use oncall_api::{
    Company, Incident, IncidentRequest, ResolutionOutcome, ResolutionRequest, UserRating,
    WorkdaySession,
};
use oncall_util::{CompanyId, WorkdayId};
use thiserror::Error;

/// Errors from simulation service calls
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether the same call could succeed if repeated unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(_) | BackendError::Unavailable(_) => true,
            BackendError::Http { status, .. } => *status >= 500,
            BackendError::Unauthorized | BackendError::Decode(_) => false,
        }
    }
}

impl From<BackendError> for oncall_util::OncallError {
    fn from(err: BackendError) -> Self {
        oncall_util::OncallError::backend(err.to_string())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Remote simulation service, implemented by the HTTP client and by the mock
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    /// Open a new workday for a company
    async fn start_workday(&self, company_id: CompanyId) -> BackendResult<WorkdaySession>;

    /// Ask the service to generate the next incident
    async fn generate_incident(&self, request: IncidentRequest) -> BackendResult<Incident>;

    /// Submit a resolution for grading
    async fn resolve_incident(&self, request: ResolutionRequest)
    -> BackendResult<ResolutionOutcome>;

    /// Close a workday
    async fn complete_workday(&self, workday_id: &WorkdayId) -> BackendResult<()>;

    /// Look up a company persona
    async fn get_company(&self, company_id: CompanyId) -> BackendResult<Company>;

    /// Fetch the user's current overall rating
    async fn user_rating(&self) -> BackendResult<UserRating>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(BackendError::Network("reset".into()).is_retryable());
        assert!(BackendError::Http { status: 502, body: String::new() }.is_retryable());
        assert!(!BackendError::Http { status: 400, body: String::new() }.is_retryable());
        assert!(!BackendError::Unauthorized.is_retryable());
    }

    #[test]
    fn error_display() {
        let err = BackendError::Http {
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404: not found");
    }
}
