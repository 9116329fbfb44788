//! Maintenance orchestrator
//!
//! One cycle: probe both clients, classify each, present the dashboard, and
//! on confirmation apply one remedial action per client. Nothing is carried
//! between cycles; every evaluation starts from fresh probes.

use crate::classifier::{classify, MaintenanceAction};
use crate::clients::{ClientId, ClientRole, ConsensusClient, ExecutionClient};
use crate::error::ActionError;
use crate::executor::ActionExecutor;
use crate::prompt::{MenuChoice, PromptOutcome, UserPrompt};
use crate::service_probe::{probe_service, ServiceManager, ServiceState};
use crate::session::Session;
use crate::version_probe::{ClientVersionSet, VersionProbe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{error, info, warn};

/// Upper bound on evaluate/apply rounds in one `run`
const MAX_CYCLES: usize = 5;

/// One service as seen by the probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// e.g. "Beacon node"
    pub label: String,
    pub unit: String,
    pub state: ServiceState,
}

/// Snapshot of one client; rebuilt on every evaluation, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMaintenanceState {
    pub client: ClientId,
    pub versions: ClientVersionSet,
    pub services: Vec<ServiceEntry>,
    pub next_step: MaintenanceAction,
}

impl ClientMaintenanceState {
    fn new(client: ClientId, versions: ClientVersionSet, services: Vec<ServiceEntry>) -> Self {
        let states: Vec<ServiceState> = services.iter().map(|s| s.state).collect();
        let next_step = classify(client.role(), &versions, &states);
        info!(
            "{} next step: {}",
            client.display_name(),
            next_step.as_str()
        );
        Self {
            client,
            versions,
            services,
            next_step,
        }
    }

    pub fn unit_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.unit.as_str()).collect()
    }
}

/// Both clients plus the aggregate recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub execution: ClientMaintenanceState,
    pub consensus: ClientMaintenanceState,
    pub maintenance_needed: bool,
}

impl DashboardReport {
    pub fn new(execution: ClientMaintenanceState, consensus: ClientMaintenanceState) -> Self {
        let maintenance_needed =
            execution.next_step.needs_maintenance() || consensus.next_step.needs_maintenance();
        Self {
            generated_at: Utc::now(),
            execution,
            consensus,
            maintenance_needed,
        }
    }

    pub fn summary_message(&self) -> &'static str {
        if self.maintenance_needed {
            "Some maintenance tasks are pending. Select maintain to perform them."
        } else {
            "Nothing is needed in terms of maintenance."
        }
    }

    /// Plain-text dashboard
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Here are some details about your Ethereum clients.");
        let _ = writeln!(out);
        render_client(&mut out, &self.execution);
        let _ = writeln!(out);
        render_client(&mut out, &self.consensus);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.summary_message());
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Versions legend - I: Installed, R: Running, A: Available, L: Latest"
        );
        out
    }
}

/// Version line, e.g. "I: 1.10.12, R: 1.10.12, A: 1.10.12, L: 1.10.13"
pub fn version_line(state: &ClientMaintenanceState) -> String {
    let v = &state.versions;
    match state.client.role() {
        ClientRole::Execution => format!(
            "I: {}, R: {}, A: {}, L: {}",
            v.installed, v.running, v.available, v.latest
        ),
        ClientRole::Consensus => format!("I: {}, R: {}, L: {}", v.installed, v.running, v.latest),
    }
}

fn render_client(out: &mut String, state: &ClientMaintenanceState) {
    let _ = writeln!(
        out,
        "{} details ({})",
        state.client.display_name(),
        version_line(state)
    );
    let services: Vec<String> = state
        .services
        .iter()
        .map(|s| format!("{}: {}", s.label, s.state.running))
        .collect();
    let _ = writeln!(out, "Running services - {}", services.join(", "));
    let _ = writeln!(out, "Maintenance task: {}", state.next_step.description());
}

/// What happened to one client during `apply`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum StepOutcome {
    /// DO_NOTHING or CHECK_AGAIN_SOON
    NoAction,
    Done { action: MaintenanceAction },
    /// Reported to the user but not fatal
    NotImplemented { action: MaintenanceAction },
    Failed { action: MaintenanceAction, error: String },
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }

    pub fn performed(&self) -> bool {
        matches!(self, StepOutcome::Done { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub execution: StepOutcome,
    pub consensus: StepOutcome,
}

impl ApplyReport {
    /// The boolean result of `apply`: false if either client failed
    pub fn succeeded(&self) -> bool {
        !self.execution.is_failure() && !self.consensus.is_failure()
    }

    pub fn performed_any(&self) -> bool {
        self.execution.performed() || self.consensus.performed()
    }

    pub fn failure_details(&self) -> String {
        let mut lines = Vec::new();
        let outcomes = [
            ("Execution client", &self.execution),
            ("Consensus client", &self.consensus),
        ];
        for (name, outcome) in outcomes {
            if let StepOutcome::Failed { action, error } = outcome {
                lines.push(format!("{} ({}): {}", name, action.as_str(), error));
            }
        }
        lines.join("\n")
    }
}

/// How a `run` ended
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Both clients need nothing
    UpToDate(DashboardReport),
    /// User quit with maintenance pending
    Quit(DashboardReport),
    /// Maintenance was applied but nothing could act on what is left
    /// (e.g. waiting for a package, or reinstall required)
    Pending(DashboardReport),
    Failed(ApplyReport),
}

pub struct MaintenanceOrchestrator<'a> {
    pub probe: VersionProbe<'a>,
    pub services: &'a dyn ServiceManager,
    pub executor: &'a dyn ActionExecutor,
}

impl<'a> MaintenanceOrchestrator<'a> {
    /// Probe and classify both selected clients
    pub fn evaluate(&self, session: &Session) -> DashboardReport {
        let execution = self.evaluate_execution(session.execution_client);
        let consensus = self.evaluate_consensus(session.consensus_client);
        let report = DashboardReport::new(execution, consensus);
        info!("Maintenance needed: {}", report.maintenance_needed);
        report
    }

    fn evaluate_execution(&self, client: ExecutionClient) -> ClientMaintenanceState {
        let unit = client.service_name();
        let services = vec![ServiceEntry {
            label: "Service".to_string(),
            unit: unit.to_string(),
            state: probe_service(self.services, unit),
        }];
        let versions = self.probe.probe_execution(client);
        ClientMaintenanceState::new(ClientId::Execution(client), versions, services)
    }

    fn evaluate_consensus(&self, client: ConsensusClient) -> ClientMaintenanceState {
        let beacon = client.beacon_service_name();
        let validator = client.validator_service_name();
        let services = vec![
            ServiceEntry {
                label: "Beacon node".to_string(),
                unit: beacon.to_string(),
                state: probe_service(self.services, beacon),
            },
            ServiceEntry {
                label: "Validator client".to_string(),
                unit: validator.to_string(),
                state: probe_service(self.services, validator),
            },
        ];
        let versions = self.probe.probe_consensus(client);
        ClientMaintenanceState::new(ClientId::Consensus(client), versions, services)
    }

    /// Apply each client's `next_step`, execution client first
    ///
    /// Both clients are always attempted. Nothing is rolled back.
    pub fn apply(
        &self,
        execution: &ClientMaintenanceState,
        consensus: &ClientMaintenanceState,
    ) -> ApplyReport {
        let execution_outcome = self.apply_one(execution);
        let consensus_outcome = self.apply_one(consensus);
        ApplyReport {
            execution: execution_outcome,
            consensus: consensus_outcome,
        }
    }

    fn apply_one(&self, state: &ClientMaintenanceState) -> StepOutcome {
        let name = state.client.display_name();
        let action = state.next_step;
        let units = state.unit_names();

        let result: Result<(), ActionError> = match action {
            MaintenanceAction::DoNothing | MaintenanceAction::CheckAgainSoon => {
                return StepOutcome::NoAction;
            }
            MaintenanceAction::RestartService => {
                info!("Restarting {} services...", name);
                self.executor.restart(&units)
            }
            MaintenanceAction::StartService => {
                info!("Starting {} services...", name);
                self.executor.start(&units)
            }
            MaintenanceAction::UpgradeClient => self.executor.upgrade(state.client),
            MaintenanceAction::ReinstallClient => self.executor.reinstall(state.client),
        };

        match result {
            Ok(()) => StepOutcome::Done { action },
            Err(ActionError::NotImplemented { .. }) => {
                warn!("Reinstalling {} is to be implemented.", name);
                StepOutcome::NotImplemented { action }
            }
            Err(e) => {
                error!("Could not {} for {}: {}", action.as_str(), name, e);
                StepOutcome::Failed {
                    action,
                    error: e.to_string(),
                }
            }
        }
    }

    /// evaluate -> confirm -> apply -> evaluate ... until done or the user quits
    pub fn run(&self, session: &Session, prompt: &dyn UserPrompt) -> CycleOutcome {
        let mut report = self.evaluate(session);
        let mut rounds = 0;

        while rounds < MAX_CYCLES {
            if !report.maintenance_needed {
                prompt.show_dashboard(&report);
                return CycleOutcome::UpToDate(report);
            }

            match prompt.confirm_maintenance(&report) {
                PromptOutcome::Proceed(MenuChoice::Maintain) | PromptOutcome::Success(()) => {}
                // Re-evaluating on request is not a maintenance round
                PromptOutcome::Proceed(MenuChoice::Retry) => {
                    report = self.evaluate(session);
                    continue;
                }
                PromptOutcome::Quit => return CycleOutcome::Quit(report),
            }

            let applied = self.apply(&report.execution, &report.consensus);
            rounds += 1;
            if !applied.succeeded() {
                error!("We could not perform all the maintenance tasks.");
                prompt.report_failure("Maintenance failed", &applied.failure_details());
                return CycleOutcome::Failed(applied);
            }

            let performed = applied.performed_any();
            report = self.evaluate(session);
            if !performed {
                // Nothing we can act on; re-presenting would loop forever
                prompt.show_dashboard(&report);
                return CycleOutcome::Pending(report);
            }
        }

        warn!("Maintenance still pending after {} rounds", MAX_CYCLES);
        prompt.show_dashboard(&report);
        CycleOutcome::Pending(report)
    }
}
