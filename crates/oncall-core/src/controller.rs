//! Workday session controller

use chrono::{DateTime, Local};
use oncall_api::{
    API_VERSION, DEFAULT_RATING, Incident, IncidentRequest, IncidentView, Phase,
    ResolutionOutcome, ResolutionRequest, SessionStats, Severity, SolutionType, WorkdaySession,
    WorkdaySnapshot,
};
use oncall_backend::{BackendResult, SimulationBackend};
use oncall_config::WorkdaySettings;
use oncall_util::{CompanyId, format_clock_time};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{ClockHandle, ClockTick, CoreEvent, IncidentClock, IntervalSampler, ScheduleClock};

/// Resolution narrative sent when an incident runs out of time
pub const TIMEOUT_RESOLUTION_APPROACH: &str =
    "Time limit reached before a resolution was submitted; escalated automatically.";

/// Outcome of a controller operation
#[derive(Debug)]
pub enum Transition {
    /// The operation ran and produced these events
    Applied(Vec<CoreEvent>),
    /// The operation does not apply in the current state
    Ignored(String),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn events(&self) -> &[CoreEvent] {
        match self {
            Transition::Applied(events) => events,
            Transition::Ignored(_) => &[],
        }
    }

    pub fn into_events(self) -> Vec<CoreEvent> {
        match self {
            Transition::Applied(events) => events,
            Transition::Ignored(_) => Vec::new(),
        }
    }
}

/// A resolution drafted by the user
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub resolution_approach: String,
    pub code_changes: String,
    pub commands_executed: Vec<String>,
    pub solution_type: SolutionType,
    pub was_successful: bool,
}

impl Submission {
    pub fn new(
        resolution_approach: impl Into<String>,
        solution_type: SolutionType,
        was_successful: bool,
    ) -> Self {
        Self {
            resolution_approach: resolution_approach.into(),
            solution_type,
            was_successful,
            ..Default::default()
        }
    }

    /// Unsuccessful escalation, chosen by the user or forced by a timeout
    pub fn escalation(resolution_approach: impl Into<String>) -> Self {
        Self::new(resolution_approach, SolutionType::Escalation, false)
    }
}

/// The workday state machine.
///
/// Owns both clocks and all session state. Every phase change goes through
/// [`WorkdayController::transition`]. Service failures leave phase, incident
/// and stats untouched.
pub struct WorkdayController {
    backend: Arc<dyn SimulationBackend>,
    settings: WorkdaySettings,
    sampler: IntervalSampler,
    rng: Pcg64Mcg,

    phase: Phase,
    session: Option<WorkdaySession>,
    incidents_scheduled: u32,
    current_rating: i32,
    incident: Option<Incident>,
    incident_count: u32,
    stats: SessionStats,
    last_outcome: Option<ResolutionOutcome>,
    resolving: bool,
    monitoring_entered: bool,

    incident_clock: IncidentClock,
    incident_timer: Option<ClockHandle>,
    schedule_clock: ScheduleClock,
    schedule_timer: Option<ClockHandle>,
}

impl WorkdayController {
    pub fn new(backend: Arc<dyn SimulationBackend>, settings: WorkdaySettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => Pcg64Mcg::seed_from_u64(seed),
            None => Pcg64Mcg::seed_from_u64(rand::random()),
        };
        let sampler = IntervalSampler::new(settings.intervals.clone());

        info!(
            seeded = settings.seed.is_some(),
            buckets = sampler.buckets().len(),
            initial_delay_secs = settings.initial_delay_seconds,
            "Workday controller initialized"
        );

        Self {
            incidents_scheduled: settings.default_incidents_scheduled,
            backend,
            settings,
            sampler,
            rng,
            phase: Phase::Idle,
            session: None,
            current_rating: DEFAULT_RATING,
            incident: None,
            incident_count: 0,
            stats: SessionStats::default(),
            last_outcome: None,
            resolving: false,
            monitoring_entered: false,
            incident_clock: IncidentClock::new(),
            incident_timer: None,
            schedule_clock: ScheduleClock::new(),
            schedule_timer: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&WorkdaySession> {
        self.session.as_ref()
    }

    pub fn current_incident(&self) -> Option<&Incident> {
        self.incident.as_ref()
    }

    pub fn incident_count(&self) -> u32 {
        self.incident_count
    }

    pub fn incidents_scheduled(&self) -> u32 {
        self.incidents_scheduled
    }

    pub fn current_rating(&self) -> i32 {
        self.current_rating
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn last_outcome(&self) -> Option<&ResolutionOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// Seconds left on the active incident
    pub fn incident_time_remaining(&self) -> Option<u64> {
        self.incident_clock.remaining()
    }

    pub fn next_incident_at(&self) -> Option<DateTime<Local>> {
        self.schedule_clock.target()
    }

    pub fn next_incident_in(&self, now: DateTime<Local>) -> Option<u64> {
        self.schedule_clock.remaining(now)
    }

    /// Start a workday for a company
    pub async fn start(
        &mut self,
        company_id: CompanyId,
        now: DateTime<Local>,
    ) -> BackendResult<Transition> {
        if self.phase != Phase::Idle {
            return Ok(self.ignore("start", "a workday has already been started"));
        }

        let session = self
            .backend
            .start_workday(company_id)
            .await
            .inspect_err(|e| warn!(company_id = %company_id, error = %e, "Failed to start workday"))?;

        let incidents_scheduled = session
            .incidents_scheduled
            .unwrap_or(self.settings.default_incidents_scheduled);

        info!(
            workday_id = %session.id,
            company_id = %company_id,
            incidents_scheduled,
            rating = session.current_rating,
            "Workday started"
        );

        let mut events = vec![CoreEvent::WorkdayStarted {
            workday_id: session.id.clone(),
            company_id,
            incidents_scheduled,
            current_rating: session.current_rating,
        }];

        self.incidents_scheduled = incidents_scheduled;
        self.current_rating = session.current_rating;
        self.session = Some(session);

        events.push(self.transition(Phase::Waiting));
        events.push(self.schedule(self.settings.initial_delay_seconds, now));

        Ok(Transition::Applied(events))
    }

    /// Advance both clocks. Expiries trigger incident generation or forced
    /// escalation; failures of those calls are reported as events.
    pub async fn tick(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        if let ClockTick::Expired(handle) = self.incident_clock.tick() {
            if self.incident_timer == Some(handle) && !self.resolving {
                self.incident_timer = None;
                info!(
                    incident_id = ?self.incident.as_ref().map(|i| i.incident_id.as_str()),
                    "Incident time limit reached, escalating"
                );

                let saved = self.begin_resolution();
                let submission = Submission::escalation(TIMEOUT_RESOLUTION_APPROACH);
                match self.finish_resolution(submission, true, saved, now).await {
                    Ok(mut resolved) => events.append(&mut resolved),
                    Err(e) => events.push(CoreEvent::BackendFailed {
                        operation: "resolve_incident".into(),
                        message: e.to_string(),
                    }),
                }
            } else {
                debug!(generation = handle.generation(), "Ignoring stale incident clock expiry");
            }
        }

        if let ClockTick::Expired(handle) = self.schedule_clock.tick(now) {
            if self.schedule_timer == Some(handle) && self.phase.awaits_incident() {
                self.schedule_timer = None;
                match self.generate(None, None).await {
                    Ok(mut generated) => events.append(&mut generated),
                    Err(e) => events.push(CoreEvent::BackendFailed {
                        operation: "generate_incident".into(),
                        message: e.to_string(),
                    }),
                }
            } else {
                debug!(generation = handle.generation(), "Ignoring stale schedule clock expiry");
            }
        }

        events
    }

    /// Submit the user's resolution for the active incident
    pub async fn resolve(
        &mut self,
        submission: Submission,
        now: DateTime<Local>,
    ) -> BackendResult<Transition> {
        if let Some(reason) = self.resolution_blocker() {
            return Ok(self.ignore("resolve", reason));
        }

        let saved = self.begin_resolution();
        self.finish_resolution(submission, false, saved, now)
            .await
            .map(Transition::Applied)
    }

    /// Give up on the active incident
    pub async fn escalate(
        &mut self,
        resolution_approach: impl Into<String>,
        now: DateTime<Local>,
    ) -> BackendResult<Transition> {
        self.resolve(Submission::escalation(resolution_approach), now)
            .await
    }

    /// Skip the remaining wait and generate the next incident immediately
    pub async fn generate_now(&mut self) -> BackendResult<Transition> {
        self.generate_now_with(None, None).await
    }

    /// Like [`generate_now`](Self::generate_now), passing severity and
    /// time-of-day hints through to the service
    pub async fn generate_now_with(
        &mut self,
        severity: Option<Severity>,
        time_of_day: Option<String>,
    ) -> BackendResult<Transition> {
        if !self.phase.awaits_incident() {
            return Ok(self.ignore("generate_now", "not waiting for an incident"));
        }

        self.schedule_clock.cancel();
        self.schedule_timer = None;

        self.generate(severity, time_of_day)
            .await
            .map(Transition::Applied)
    }

    /// Close the workday. Only allowed while monitoring.
    pub async fn end_day(&mut self) -> BackendResult<Transition> {
        if self.phase != Phase::Monitoring {
            return Ok(self.ignore("end_day", "the workday can only end while monitoring"));
        }
        let Some(workday_id) = self.session.as_ref().map(|s| s.id.clone()) else {
            return Ok(self.ignore("end_day", "no workday session"));
        };

        self.backend
            .complete_workday(&workday_id)
            .await
            .inspect_err(|e| warn!(workday_id = %workday_id, error = %e, "Failed to complete workday"))?;

        self.schedule_clock.cancel();
        self.schedule_timer = None;
        self.incident_clock.cancel();
        self.incident_timer = None;
        self.session = None;

        info!(
            workday_id = %workday_id,
            incidents = self.incident_count,
            resolved = self.stats.resolved,
            escalated = self.stats.escalated,
            abandoned = self.stats.abandoned,
            "Workday completed"
        );

        let events = vec![
            self.transition(Phase::Completed),
            CoreEvent::WorkdayCompleted {
                workday_id,
                stats: self.stats,
            },
        ];

        Ok(Transition::Applied(events))
    }

    /// Drop the workday without telling the service (the user navigated away)
    pub fn abandon(&mut self) -> Transition {
        if self.phase == Phase::Idle || self.phase.is_terminal() {
            return self.ignore("abandon", "no workday in progress");
        }

        self.incident_clock.cancel();
        self.incident_timer = None;
        self.schedule_clock.cancel();
        self.schedule_timer = None;

        if let Some(session) = &self.session {
            info!(workday_id = %session.id, incidents = self.incident_count, "Workday abandoned");
        }

        self.session = None;
        self.incident = None;
        self.incident_count = 0;
        self.incidents_scheduled = self.settings.default_incidents_scheduled;
        self.stats = SessionStats::default();
        self.last_outcome = None;
        self.resolving = false;
        self.monitoring_entered = false;

        Transition::Applied(vec![self.transition(Phase::Idle)])
    }

    pub fn snapshot(&self, now: DateTime<Local>) -> WorkdaySnapshot {
        WorkdaySnapshot {
            api_version: API_VERSION,
            phase: self.phase,
            workday_id: self.session.as_ref().map(|s| s.id.clone()),
            company_id: self.session.as_ref().map(|s| s.company_id),
            incident_count: self.incident_count,
            incidents_scheduled: self.incidents_scheduled,
            current_rating: self.current_rating,
            current_incident: self.incident.as_ref().map(|incident| IncidentView {
                incident_id: incident.incident_id.clone(),
                title: incident.title.clone(),
                severity: incident.severity.clone(),
                time_limit_minutes: incident.time_limit_minutes,
                affected_services: incident.affected_services.clone(),
                time_remaining_secs: self.incident_clock.remaining(),
            }),
            next_incident_at: self.schedule_clock.target(),
            next_incident_in_secs: self.schedule_clock.remaining(now),
            stats: self.stats,
            last_outcome: self.last_outcome.clone(),
            resolving: self.resolving,
        }
    }

    fn resolution_blocker(&self) -> Option<&'static str> {
        if self.phase != Phase::Active || self.incident.is_none() {
            Some("no active incident")
        } else if self.resolving {
            Some("a resolution is already in flight")
        } else {
            None
        }
    }

    /// Disarm the incident clock and mark a resolution in flight.
    /// Returns the seconds that were left on the clock.
    fn begin_resolution(&mut self) -> Option<u64> {
        let remaining = self.incident_clock.remaining();
        self.incident_clock.cancel();
        self.incident_timer = None;
        self.resolving = true;
        remaining
    }

    async fn finish_resolution(
        &mut self,
        submission: Submission,
        forced: bool,
        saved_remaining: Option<u64>,
        now: DateTime<Local>,
    ) -> BackendResult<Vec<CoreEvent>> {
        let Some(incident_id) = self.incident.as_ref().map(|i| i.incident_id.clone()) else {
            self.resolving = false;
            return Ok(Vec::new());
        };

        let solution_type = submission.solution_type;
        let request = ResolutionRequest {
            incident_id: incident_id.clone(),
            resolution_approach: submission.resolution_approach,
            code_changes: submission.code_changes,
            commands_executed: submission.commands_executed,
            solution_type,
            was_successful: submission.was_successful,
        };

        let result = self.backend.resolve_incident(request).await;
        self.resolving = false;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(incident_id = %incident_id, forced, error = %e, "Failed to resolve incident");
                // A timed-out incident stays disarmed so it cannot retry on its own
                if let Some(remaining) = saved_remaining.filter(|r| *r > 0) {
                    self.incident_timer = Some(self.incident_clock.arm(remaining));
                }
                return Err(e);
            }
        };

        self.stats.record(&outcome.incident_status);
        self.current_rating = outcome.new_overall_rating;
        if let Some(session) = &mut self.session {
            session.current_rating = outcome.new_overall_rating;
        }
        self.incident = None;

        info!(
            incident_id = %incident_id,
            status = outcome.incident_status.as_str(),
            forced,
            rating = outcome.new_overall_rating,
            rating_change = outcome.rating_change,
            "Incident resolved"
        );

        let mut events = vec![CoreEvent::IncidentResolved {
            incident_id,
            solution_type,
            forced,
            outcome: outcome.clone(),
        }];
        self.last_outcome = Some(outcome);

        let next = if self.incident_count >= self.incidents_scheduled {
            Phase::Monitoring
        } else {
            Phase::Waiting
        };
        events.push(self.transition(next));

        if next == Phase::Monitoring && !self.monitoring_entered {
            self.monitoring_entered = true;
            info!(
                incident_count = self.incident_count,
                "Incident target reached, monitoring"
            );
            events.push(CoreEvent::MonitoringEntered {
                incident_count: self.incident_count,
            });
        }

        let delay = self.sampler.sample(&mut self.rng);
        events.push(self.schedule(delay, now));

        Ok(events)
    }

    async fn generate(
        &mut self,
        severity: Option<Severity>,
        time_of_day: Option<String>,
    ) -> BackendResult<Vec<CoreEvent>> {
        let Some(company_id) = self.session.as_ref().map(|s| s.company_id) else {
            return Ok(Vec::new());
        };

        let request = IncidentRequest::for_company(company_id)
            .with_severity(severity)
            .with_time_of_day(time_of_day);

        let incident = self
            .backend
            .generate_incident(request)
            .await
            .inspect_err(|e| warn!(company_id = %company_id, error = %e, "Failed to generate incident"))?;

        self.incident_count += 1;
        self.incident_timer = Some(self.incident_clock.arm(incident.time_limit_seconds()));

        info!(
            incident_id = %incident.incident_id,
            severity = incident.severity.as_str(),
            impact = incident.severity.label(),
            time_limit_minutes = incident.time_limit_minutes,
            incident_number = self.incident_count,
            "Incident arrived"
        );

        let events = vec![
            self.transition(Phase::Active),
            CoreEvent::IncidentArrived {
                incident: incident.clone(),
                incident_number: self.incident_count,
            },
        ];
        self.incident = Some(incident);

        Ok(events)
    }

    fn schedule(&mut self, delay_secs: u64, now: DateTime<Local>) -> CoreEvent {
        self.schedule_timer = Some(self.schedule_clock.arm(delay_secs, now));
        let next_incident_at = self.schedule_clock.target().unwrap_or(now);

        debug!(
            delay_secs,
            next_incident_at = %format_clock_time(&next_incident_at),
            "Next incident scheduled"
        );

        CoreEvent::IncidentScheduled {
            next_incident_at,
            delay_secs,
        }
    }

    fn transition(&mut self, to: Phase) -> CoreEvent {
        let from = self.phase;
        self.phase = to;

        info!(from = ?from, to = ?to, incident_count = self.incident_count, "Phase changed");

        CoreEvent::PhaseChanged { from, to }
    }

    fn ignore(&self, operation: &str, reason: &str) -> Transition {
        debug!(operation, phase = ?self.phase, reason, "Ignored");
        Transition::Ignored(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use oncall_api::IncidentStatus;
    use oncall_backend::MockBackend;

    fn nine_am() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
    }

    fn settings() -> WorkdaySettings {
        WorkdaySettings {
            seed: Some(7),
            ..Default::default()
        }
    }

    fn controller(backend: &Arc<MockBackend>) -> WorkdayController {
        WorkdayController::new(backend.clone(), settings())
    }

    /// Tick at the scheduled time so the schedule clock fires
    async fn fire_schedule(c: &mut WorkdayController) -> Vec<CoreEvent> {
        let at = c.next_incident_at().expect("schedule clock armed");
        c.tick(at).await
    }

    fn phases(events: &[CoreEvent]) -> Vec<(Phase, Phase)> {
        events
            .iter()
            .filter_map(|e| match e {
                CoreEvent::PhaseChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_start_arms_initial_delay() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);
        let now = nine_am();

        let t = c.start(CompanyId::new(7), now).await.unwrap();
        assert!(t.is_applied());
        assert_eq!(c.phase(), Phase::Waiting);
        assert_eq!(c.next_incident_at(), Some(now + Duration::seconds(5)));
        assert_eq!(c.next_incident_in(now), Some(5));

        // Nothing happens before the delay elapses
        let events = c.tick(now + Duration::seconds(4)).await;
        assert!(events.is_empty());
        assert_eq!(c.phase(), Phase::Waiting);

        let events = c.tick(now + Duration::seconds(5)).await;
        assert_eq!(phases(&events), vec![(Phase::Waiting, Phase::Active)]);
        assert_eq!(c.incident_count(), 1);
        assert!(c.incident_time_remaining().is_some());
    }

    #[tokio::test]
    async fn test_missing_target_defaults() {
        let backend = Arc::new(MockBackend::new().with_incidents_scheduled(None));
        let mut c = controller(&backend);

        c.start(CompanyId::new(7), nine_am()).await.unwrap();
        assert_eq!(c.incidents_scheduled(), 8);
    }

    #[tokio::test]
    async fn test_single_incident_goes_straight_to_monitoring() {
        let backend = Arc::new(MockBackend::new().with_incidents_scheduled(Some(1)));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;
        assert_eq!(c.phase(), Phase::Active);

        let t = c
            .resolve(Submission::new("fixed it", SolutionType::RootCause, true), now)
            .await
            .unwrap();

        assert_eq!(phases(t.events()), vec![(Phase::Active, Phase::Monitoring)]);
        assert!(
            t.events()
                .iter()
                .any(|e| matches!(e, CoreEvent::MonitoringEntered { incident_count: 1 }))
        );
        assert_eq!(c.phase(), Phase::Monitoring);
        assert!(c.next_incident_at().is_some());
    }

    #[tokio::test]
    async fn test_three_incident_cycle() {
        let backend = Arc::new(MockBackend::new().with_incidents_scheduled(Some(3)));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.extend(phases(&fire_schedule(&mut c).await));
            let t = c
                .resolve(Submission::new("patched", SolutionType::Workaround, true), now)
                .await
                .unwrap();
            seen.extend(phases(t.events()));
        }

        assert_eq!(
            seen,
            vec![
                (Phase::Waiting, Phase::Active),
                (Phase::Active, Phase::Waiting),
                (Phase::Waiting, Phase::Active),
                (Phase::Active, Phase::Waiting),
                (Phase::Waiting, Phase::Active),
                (Phase::Active, Phase::Monitoring),
            ]
        );
        assert_eq!(c.stats().resolved, 3);
    }

    #[tokio::test]
    async fn test_monitoring_entered_once() {
        let backend = Arc::new(MockBackend::new().with_incidents_scheduled(Some(1)));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();

        let mut entered = 0;
        for _ in 0..3 {
            fire_schedule(&mut c).await;
            let t = c.escalate("paged the owning team", now).await.unwrap();
            entered += t
                .events()
                .iter()
                .filter(|e| matches!(e, CoreEvent::MonitoringEntered { .. }))
                .count();
            assert_eq!(c.phase(), Phase::Monitoring);
        }

        assert_eq!(entered, 1);
        assert_eq!(c.incident_count(), 3);
        assert_eq!(c.stats().escalated, 3);
    }

    #[tokio::test]
    async fn test_timeout_forces_escalation() {
        let backend = Arc::new(MockBackend::new().with_time_limit_minutes(0));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;
        assert_eq!(c.phase(), Phase::Active);

        let events = c.tick(now + Duration::seconds(6)).await;
        assert!(events.iter().any(|e| matches!(
            e,
            CoreEvent::IncidentResolved {
                forced: true,
                solution_type: SolutionType::Escalation,
                ..
            }
        )));
        assert_eq!(c.phase(), Phase::Waiting);

        let calls = backend.calls();
        assert_eq!(calls.resolutions.len(), 1);
        assert!(!calls.resolutions[0].was_successful);
        assert_eq!(calls.resolutions[0].solution_type, SolutionType::Escalation);
    }

    #[tokio::test]
    async fn test_resolve_after_timeout_is_noop() {
        let backend = Arc::new(MockBackend::new().with_time_limit_minutes(0));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;
        c.tick(now + Duration::seconds(6)).await;

        let t = c
            .resolve(Submission::new("too late", SolutionType::RootCause, true), now)
            .await
            .unwrap();
        assert!(matches!(t, Transition::Ignored(_)));
        assert_eq!(backend.calls().resolutions.len(), 1);
        assert_eq!(c.stats().total(), 1);
    }

    #[tokio::test]
    async fn test_manual_submission_beats_expiry() {
        let backend = Arc::new(MockBackend::new().with_time_limit_minutes(0));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;

        // Submission lands first and disarms the clock
        let saved = c.begin_resolution();
        assert!(c.tick(now + Duration::seconds(6)).await.is_empty());

        let events = c
            .finish_resolution(
                Submission::new("rolled back", SolutionType::RootCause, true),
                false,
                saved,
                now,
            )
            .await
            .unwrap();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, CoreEvent::IncidentResolved { forced: false, .. }))
        );
        assert_eq!(backend.calls().resolutions.len(), 1);
        assert_eq!(c.stats().resolved, 1);
    }

    #[tokio::test]
    async fn test_second_submission_while_resolving_is_noop() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;

        c.begin_resolution();
        assert!(c.is_resolving());

        let t = c.escalate("again", now).await.unwrap();
        assert!(matches!(t, Transition::Ignored(_)));
        assert!(backend.calls().resolutions.is_empty());
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_state() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        backend.set_fail_generate(true);

        let events = fire_schedule(&mut c).await;
        assert!(matches!(events[..], [CoreEvent::BackendFailed { .. }]));
        assert_eq!(c.phase(), Phase::Waiting);
        assert_eq!(c.incident_count(), 0);
        assert!(c.next_incident_at().is_none());

        // No automatic retry
        assert!(c.tick(now + Duration::seconds(60)).await.is_empty());

        backend.set_fail_generate(false);
        let t = c.generate_now().await.unwrap();
        assert!(t.is_applied());
        assert_eq!(c.phase(), Phase::Active);
        assert_eq!(c.incident_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_resolution_keeps_incident() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;
        let remaining = c.incident_time_remaining();

        backend.set_fail_resolve(true);
        let result = c
            .resolve(Submission::new("restart", SolutionType::Workaround, true), now)
            .await;

        assert!(result.is_err());
        assert_eq!(c.phase(), Phase::Active);
        assert!(c.current_incident().is_some());
        assert!(!c.is_resolving());
        assert_eq!(c.stats().total(), 0);
        assert_eq!(c.incident_time_remaining(), remaining);

        backend.set_fail_resolve(false);
        let t = c
            .resolve(Submission::new("restart", SolutionType::Workaround, true), now)
            .await
            .unwrap();
        assert!(t.is_applied());
        assert_eq!(c.stats().resolved, 1);
    }

    #[tokio::test]
    async fn test_failed_forced_escalation_waits_for_user() {
        let backend = Arc::new(MockBackend::new().with_time_limit_minutes(1));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        let at = c.next_incident_at().unwrap();
        c.tick(at).await;
        assert_eq!(c.incident_time_remaining(), Some(60));

        backend.set_fail_resolve(true);
        let mut failures = Vec::new();
        for _ in 0..60 {
            failures.extend(c.tick(at).await);
        }
        assert!(matches!(
            failures.as_slice(),
            [CoreEvent::BackendFailed { operation, .. }] if operation == "resolve_incident"
        ));

        assert_eq!(c.phase(), Phase::Active);
        assert!(c.current_incident().is_some());
        assert_eq!(c.incident_time_remaining(), None);
        assert!(!c.is_resolving());
        assert_eq!(c.stats().total(), 0);

        // The disarmed clock does not retry on its own
        for _ in 0..120 {
            assert!(c.tick(at).await.is_empty());
        }

        backend.set_fail_resolve(false);
        let t = c
            .resolve(Submission::new("manual fix", SolutionType::RootCause, true), at)
            .await
            .unwrap();
        assert!(t.is_applied());
        assert_eq!(c.stats().resolved, 1);
        assert_eq!(c.phase(), Phase::Waiting);
        assert_eq!(backend.calls().resolutions.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_end_day_keeps_monitoring() {
        let backend = Arc::new(MockBackend::new().with_incidents_scheduled(Some(1)));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;
        c.resolve(Submission::new("done", SolutionType::RootCause, true), now)
            .await
            .unwrap();
        assert_eq!(c.phase(), Phase::Monitoring);
        let next = c.next_incident_at();
        assert!(next.is_some());

        *backend.fail_complete.lock().unwrap() = true;
        assert!(c.end_day().await.is_err());

        assert_eq!(c.phase(), Phase::Monitoring);
        assert_eq!(c.next_incident_at(), next);
        assert!(c.session().is_some());
        assert!(backend.calls().completed.is_empty());

        *backend.fail_complete.lock().unwrap() = false;
        assert!(c.end_day().await.unwrap().is_applied());
        assert_eq!(c.phase(), Phase::Completed);
        assert_eq!(backend.calls().completed.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_now_passes_hints() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);

        c.start(CompanyId::new(7), nine_am()).await.unwrap();
        let t = c
            .generate_now_with(Some(Severity::P2), Some("morning".into()))
            .await
            .unwrap();
        assert!(t.is_applied());

        let generated = backend.calls().generated;
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].company_id, CompanyId::new(7));
        assert_eq!(generated[0].severity, Some(Severity::P2));
        assert_eq!(generated[0].time_of_day.as_deref(), Some("morning"));

        // Scheduled generation sends no hints
        let now = nine_am();
        c.resolve(Submission::new("ok", SolutionType::Workaround, true), now)
            .await
            .unwrap();
        fire_schedule(&mut c).await;
        let generated = backend.calls().generated;
        assert_eq!(generated.len(), 2);
        assert!(generated[1].severity.is_none());
        assert!(generated[1].time_of_day.is_none());
    }

    #[tokio::test]
    async fn test_end_day_only_while_monitoring() {
        let backend = Arc::new(MockBackend::new().with_incidents_scheduled(Some(1)));
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        assert!(matches!(c.end_day().await.unwrap(), Transition::Ignored(_)));

        fire_schedule(&mut c).await;
        c.resolve(Submission::new("done", SolutionType::RootCause, true), now)
            .await
            .unwrap();

        let t = c.end_day().await.unwrap();
        assert_eq!(phases(t.events()), vec![(Phase::Monitoring, Phase::Completed)]);
        assert!(c.next_incident_at().is_none());
        assert_eq!(backend.calls().completed.len(), 1);

        // Terminal
        assert!(!c.start(CompanyId::new(7), now).await.unwrap().is_applied());
        assert!(!c.generate_now().await.unwrap().is_applied());
        assert!(c.tick(now + Duration::seconds(20_000)).await.is_empty());
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);

        c.start(CompanyId::new(7), nine_am()).await.unwrap();
        let t = c.start(CompanyId::new(8), nine_am()).await.unwrap();

        assert!(matches!(t, Transition::Ignored(_)));
        assert_eq!(backend.calls().started.len(), 1);
    }

    #[tokio::test]
    async fn test_abandon_discards_session() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;

        let t = c.abandon();
        assert_eq!(phases(t.events()), vec![(Phase::Active, Phase::Idle)]);
        assert!(c.session().is_none());
        assert!(c.current_incident().is_none());
        assert!(c.incident_time_remaining().is_none());
        assert!(c.next_incident_at().is_none());
        assert!(backend.calls().completed.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot() {
        let backend = Arc::new(MockBackend::new());
        let mut c = controller(&backend);
        let now = nine_am();

        c.start(CompanyId::new(7), now).await.unwrap();
        fire_schedule(&mut c).await;
        c.resolve(Submission::new("fixed", SolutionType::RootCause, true), now)
            .await
            .unwrap();

        let snapshot = c.snapshot(now);
        assert_eq!(snapshot.phase, Phase::Waiting);
        assert_eq!(snapshot.company_id, Some(CompanyId::new(7)));
        assert_eq!(snapshot.incident_count, 1);
        assert_eq!(snapshot.stats.resolved, 1);
        assert_eq!(snapshot.current_rating, DEFAULT_RATING + 15);
        assert!(snapshot.current_incident.is_none());
        assert_eq!(
            snapshot.last_outcome.map(|o| o.incident_status),
            Some(IncidentStatus::Resolved)
        );
        assert!(snapshot.next_incident_in_secs.unwrap() >= 10);
    }
}
