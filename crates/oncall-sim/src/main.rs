//! oncall-sim - headless on-call workday driver
//!
//! Wires together:
//! - Configuration loading
//! - The simulation service client (HTTP, bearer auth)
//! - The workday controller and its one-second tick
//! - NDJSON commands on stdin, NDJSON events on stdout

use anyhow::{Context, Result};
use clap::Parser;
use oncall_api::{Command, Event, EventPayload, Phase};
use oncall_backend::{BackendResult, SimulationBackend};
use oncall_config::{Settings, load_config};
use oncall_core::{CoreEvent, Submission, TICK_INTERVAL, Transition, WorkdayController};
use oncall_http::HttpBackend;
use oncall_util::{CompanyId, OncallError, default_config_path, format_minutes};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// oncall-sim - simulated on-call workday
#[derive(Parser, Debug)]
#[command(name = "oncall-sim")]
#[command(about = "Run a simulated on-call workday against the simulation service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/oncall-sim/config.toml)
    #[arg(short, long, env = "ONCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Company persona to use when `start` names none
    #[arg(long, env = "ONCALL_COMPANY")]
    company: Option<i64>,

    /// Simulation service base URL override
    #[arg(long, env = "ONCALL_API_URL")]
    api_url: Option<String>,

    /// RNG seed for reproducible incident schedules
    #[arg(long)]
    seed: Option<u64>,

    /// Start the workday immediately instead of waiting for a `start` command
    #[arg(long)]
    auto_start: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

/// Whether the main loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Driver state: the controller plus the event sink
struct Service<W> {
    controller: WorkdayController,
    backend: Arc<dyn SimulationBackend>,
    default_company: Option<CompanyId>,
    out: W,
}

impl<W: AsyncWrite + Unpin> Service<W> {
    fn new(
        controller: WorkdayController,
        backend: Arc<dyn SimulationBackend>,
        default_company: Option<CompanyId>,
        out: W,
    ) -> Self {
        Self {
            controller,
            backend,
            default_company,
            out,
        }
    }

    async fn run<R: AsyncBufRead + Unpin>(mut self, input: R, auto_start: bool) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        let mut lines = input.lines();
        let mut tick_timer = tokio::time::interval(TICK_INTERVAL);

        self.emit_state().await?;
        if auto_start {
            self.handle_command(Command::Start { company_id: None }).await?;
        }

        info!(tick_ms = TICK_INTERVAL.as_millis() as u64, "Driver running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down");
                    break;
                }

                _ = tick_timer.tick() => {
                    self.on_tick().await?;
                }

                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if self.handle_line(&line).await? == Flow::Quit {
                                info!("Quit requested");
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("Input closed, shutting down");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to read command");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        let phase = self.controller.phase();
        if phase != Phase::Idle && !phase.is_terminal() {
            warn!(phase = ?phase, "Abandoning unfinished workday");
            let events = self.controller.abandon().into_events();
            self.emit_all(events).await?;
        }

        self.emit(EventPayload::Shutdown).await?;
        info!("Driver stopped");
        Ok(())
    }

    async fn on_tick(&mut self) -> Result<()> {
        let events = self.controller.tick(oncall_util::now()).await;
        if events.is_empty() {
            return Ok(());
        }

        self.emit_all(events).await?;
        self.emit_state().await
    }

    /// Parse and run one command line
    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        match serde_json::from_str::<Command>(line) {
            Ok(command) => self.handle_command(command).await,
            Err(e) => {
                let err = OncallError::protocol(e.to_string());
                warn!(error = %err, "Rejected malformed command");
                self.emit(EventPayload::Error {
                    message: err.to_string(),
                })
                .await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> Result<Flow> {
        let name = command.name();
        let now = oncall_util::now();
        debug!(command = name, "Handling command");

        let result = match command {
            Command::GetState => {
                self.emit_state().await?;
                return Ok(Flow::Continue);
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Start { company_id } => {
                let Some(company_id) = company_id.or(self.default_company) else {
                    self.reject(name, "no company given and none configured")
                        .await?;
                    return Ok(Flow::Continue);
                };
                self.controller.start(company_id, now).await
            }
            Command::Resolve {
                resolution_approach,
                solution_type,
                was_successful,
                code_changes,
                commands_executed,
            } => {
                let submission = Submission {
                    resolution_approach,
                    code_changes,
                    commands_executed,
                    solution_type,
                    was_successful,
                };
                self.controller.resolve(submission, now).await
            }
            Command::Escalate {
                resolution_approach,
            } => self.controller.escalate(resolution_approach, now).await,
            Command::GenerateNow {
                severity,
                time_of_day,
            } => {
                self.controller
                    .generate_now_with(severity, time_of_day)
                    .await
            }
            Command::EndDay => self.controller.end_day().await,
        };

        self.publish(name, result).await?;
        Ok(Flow::Continue)
    }

    async fn publish(&mut self, command: &str, result: BackendResult<Transition>) -> Result<()> {
        match result {
            Ok(Transition::Applied(events)) => {
                let completed = events
                    .iter()
                    .any(|e| matches!(e, CoreEvent::WorkdayCompleted { .. }));

                self.emit_all(events).await?;
                self.emit_state().await?;

                if completed {
                    self.report_rating().await;
                }
                Ok(())
            }
            Ok(Transition::Ignored(reason)) => self.reject(command, &reason).await,
            Err(e) => {
                error!(command, error = %e, retryable = e.is_retryable(), "Command failed");
                self.emit(EventPayload::Error {
                    message: format!("{} failed: {}", command, e),
                })
                .await
            }
        }
    }

    async fn report_rating(&self) {
        match self.backend.user_rating().await {
            Ok(rating) => info!(
                rating = rating.overall_rating,
                tier = rating.tier().label(),
                resolved_total = rating.statistics.total_incidents_resolved,
                average_resolution = %format_minutes(rating.statistics.average_resolution_time.round() as u64),
                "Final rating"
            ),
            Err(e) => warn!(error = %e, "Failed to fetch final rating"),
        }
    }

    async fn reject(&mut self, command: &str, reason: &str) -> Result<()> {
        debug!(command, reason, "Command rejected");
        self.emit(EventPayload::CommandRejected {
            command: command.to_string(),
            reason: reason.to_string(),
        })
        .await
    }

    async fn emit_state(&mut self) -> Result<()> {
        let snapshot = self.controller.snapshot(oncall_util::now());
        self.emit(EventPayload::StateChanged(snapshot)).await
    }

    async fn emit_all(&mut self, events: Vec<CoreEvent>) -> Result<()> {
        for event in events {
            self.emit(event.into()).await?;
        }
        Ok(())
    }

    async fn emit(&mut self, payload: EventPayload) -> Result<()> {
        let mut line = serde_json::to_vec(&Event::new(payload)).context("Failed to encode event")?;
        line.push(b'\n');

        self.out
            .write_all(&line)
            .await
            .context("Failed to write event")?;
        self.out.flush().await.context("Failed to flush events")?;
        Ok(())
    }
}

/// Load settings from the given path, or from the default path when present
fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!(path = %path.display(), "No config file, using defaults");
                Ok(Settings::default())
            }
        }
    }
}

async fn build_service(args: &Args) -> Result<Service<tokio::io::Stdout>> {
    let mut settings = load_settings(args.config.as_ref())?;

    if let Some(url) = &args.api_url {
        settings.api.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(company) = args.company {
        anyhow::ensure!(company > 0, "Company id must be positive, got {}", company);
        settings.workday.company_id = Some(CompanyId::new(company));
    }
    if args.seed.is_some() {
        settings.workday.seed = args.seed;
    }

    info!(
        base_url = %settings.api.base_url,
        company_id = ?settings.workday.company_id.map(|c| c.get()),
        "Configuration loaded"
    );

    let http = HttpBackend::new(&settings.api.base_url, settings.api.request_timeout)
        .context("Failed to create HTTP client")?;

    if let Some(token) = &settings.auth.access_token {
        http.set_access_token(token.clone()).await;
    }
    if let Some(creds) = &settings.auth.credentials {
        http.login(&creds.email, &creds.password)
            .await
            .with_context(|| format!("Failed to log in as {}", creds.email))?;
    }

    info!(
        authenticated = http.tokens().is_authenticated().await,
        "Simulation service client ready"
    );

    let backend: Arc<dyn SimulationBackend> = Arc::new(http);

    if let Some(company_id) = settings.workday.company_id {
        match backend.get_company(company_id).await {
            Ok(company) => info!(
                company_id = %company.id,
                name = %company.name,
                industry = %company.industry,
                "Company loaded"
            ),
            Err(e) => warn!(company_id = %company_id, error = %e, "Failed to load company"),
        }
    }

    let controller = WorkdayController::new(backend.clone(), settings.workday.clone());
    let service = Service::new(
        controller,
        backend,
        settings.workday.company_id,
        tokio::io::stdout(),
    );

    Ok(service)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the event stream, so logs go to stderr
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "oncall-sim starting");

    if oncall_util::is_mock_time_active() {
        warn!(now = %oncall_util::format_datetime_full(&oncall_util::now()), "Mock time is active");
    }

    let service = build_service(&args).await?;
    let input = BufReader::new(tokio::io::stdin());

    service.run(input, args.auto_start).await
}
