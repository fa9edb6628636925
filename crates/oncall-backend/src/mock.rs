//! Mock simulation backend for testing

use async_trait::async_trait;
use oncall_api::{
    Company, Grading, Incident, IncidentRequest, IncidentStatus, RatingStatistics,
    ResolutionOutcome, ResolutionRequest, Severity, SolutionType, UserRating, WorkdaySession,
    DEFAULT_RATING,
};
use oncall_util::{CompanyId, IncidentId, WorkdayId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::{BackendError, BackendResult, SimulationBackend};

/// Calls observed by the mock
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    pub started: Vec<CompanyId>,
    pub generated: Vec<IncidentRequest>,
    pub resolutions: Vec<ResolutionRequest>,
    pub completed: Vec<WorkdayId>,
}

/// In-memory simulation backend for unit/integration testing
pub struct MockBackend {
    next_id: AtomicU64,
    rating: Arc<Mutex<i32>>,
    calls: Arc<Mutex<MockCalls>>,

    /// Configure start_workday to fail
    pub fail_start: Arc<Mutex<bool>>,

    /// Configure generate_incident to fail
    pub fail_generate: Arc<Mutex<bool>>,

    /// Configure resolve_incident to fail
    pub fail_resolve: Arc<Mutex<bool>>,

    /// Configure complete_workday to fail
    pub fail_complete: Arc<Mutex<bool>>,

    /// Target count reported by start_workday (None = omitted)
    pub incidents_scheduled: Arc<Mutex<Option<u32>>>,

    /// Time limit given to generated incidents
    pub time_limit_minutes: Arc<Mutex<u32>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            rating: Arc::new(Mutex::new(DEFAULT_RATING)),
            calls: Arc::new(Mutex::new(MockCalls::default())),
            fail_start: Arc::new(Mutex::new(false)),
            fail_generate: Arc::new(Mutex::new(false)),
            fail_resolve: Arc::new(Mutex::new(false)),
            fail_complete: Arc::new(Mutex::new(false)),
            incidents_scheduled: Arc::new(Mutex::new(Some(oncall_api::DEFAULT_INCIDENTS_SCHEDULED))),
            time_limit_minutes: Arc::new(Mutex::new(30)),
        }
    }

    pub fn with_incidents_scheduled(self, count: Option<u32>) -> Self {
        *self.incidents_scheduled.lock().unwrap() = count;
        self
    }

    pub fn with_time_limit_minutes(self, minutes: u32) -> Self {
        *self.time_limit_minutes.lock().unwrap() = minutes;
        self
    }

    /// Snapshot of the calls made so far
    pub fn calls(&self) -> MockCalls {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_fail_generate(&self, fail: bool) {
        *self.fail_generate.lock().unwrap() = fail;
    }

    pub fn set_fail_resolve(&self, fail: bool) {
        *self.fail_resolve.lock().unwrap() = fail;
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn failure(what: &str) -> BackendError {
        BackendError::Unavailable(format!("Mock {} failure", what))
    }

    /// Grade a submission the way the tests expect: success resolves,
    /// escalation escalates, anything else is abandoned.
    fn grade(request: &ResolutionRequest) -> (IncidentStatus, i32) {
        if request.was_successful {
            (IncidentStatus::Resolved, 15)
        } else if request.solution_type == SolutionType::Escalation {
            (IncidentStatus::Escalated, -10)
        } else {
            (IncidentStatus::Abandoned, -20)
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulationBackend for MockBackend {
    async fn start_workday(&self, company_id: CompanyId) -> BackendResult<WorkdaySession> {
        if *self.fail_start.lock().unwrap() {
            return Err(Self::failure("start"));
        }

        self.calls.lock().unwrap().started.push(company_id);

        Ok(WorkdaySession {
            id: WorkdayId::new(format!("wd-{}", self.next_id())),
            company_id,
            incidents_scheduled: *self.incidents_scheduled.lock().unwrap(),
            current_rating: *self.rating.lock().unwrap(),
            is_active: true,
        })
    }

    async fn generate_incident(&self, request: IncidentRequest) -> BackendResult<Incident> {
        if *self.fail_generate.lock().unwrap() {
            return Err(Self::failure("generate"));
        }

        let id = self.next_id();
        self.calls.lock().unwrap().generated.push(request.clone());

        Ok(Incident {
            incident_id: IncidentId::new(format!("inc-{}", id)),
            title: format!("Mock incident {}", id),
            description: "Elevated error rate on checkout".into(),
            severity: request.severity.unwrap_or(Severity::P2),
            time_limit_minutes: *self.time_limit_minutes.lock().unwrap(),
            affected_services: vec!["checkout".into()],
            error_logs: String::new(),
            codebase_context: String::new(),
            monitoring_dashboard_url: None,
        })
    }

    async fn resolve_incident(
        &self,
        request: ResolutionRequest,
    ) -> BackendResult<ResolutionOutcome> {
        if *self.fail_resolve.lock().unwrap() {
            return Err(Self::failure("resolve"));
        }

        let (status, change) = Self::grade(&request);
        let new_rating = {
            let mut rating = self.rating.lock().unwrap();
            *rating += change;
            *rating
        };
        let resolved = status == IncidentStatus::Resolved;
        self.calls.lock().unwrap().resolutions.push(request);

        Ok(ResolutionOutcome {
            incident_status: status,
            new_overall_rating: new_rating,
            rating_change: change,
            time_spent_minutes: 1.0,
            incident_resolved: resolved,
            attempt_id: Some(format!("attempt-{}", self.next_id())),
            grading: Some(Grading {
                score: if resolved { 85.0 } else { 20.0 },
                feedback: "Mock grading".into(),
                grading_method: "mock".into(),
            }),
        })
    }

    async fn complete_workday(&self, workday_id: &WorkdayId) -> BackendResult<()> {
        if *self.fail_complete.lock().unwrap() {
            return Err(Self::failure("complete"));
        }

        self.calls.lock().unwrap().completed.push(workday_id.clone());
        Ok(())
    }

    async fn get_company(&self, company_id: CompanyId) -> BackendResult<Company> {
        if company_id.get() <= 0 {
            return Err(BackendError::Http {
                status: 404,
                body: "Not found.".into(),
            });
        }

        Ok(Company {
            id: company_id,
            name: format!("Mock Company {}", company_id),
            description: String::new(),
            industry: "Technology".into(),
            company_size: "startup".into(),
            tech_stack: vec!["rust".into(), "postgres".into()],
        })
    }

    async fn user_rating(&self) -> BackendResult<UserRating> {
        Ok(UserRating {
            overall_rating: *self.rating.lock().unwrap(),
            rating_category: None,
            rating_percentile: None,
            points_to_next_category: None,
            statistics: RatingStatistics::default(),
        })
    }
}
