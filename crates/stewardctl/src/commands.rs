//! Command handlers
//!
//! Each handler returns the process exit code.

use crate::dashboard;
use crate::errors::{EXIT_MAINTENANCE_FAILED, EXIT_SUCCESS};
use crate::prompt::TerminalPrompt;
use anyhow::{Context, Result};
use std::path::PathBuf;
use steward_common::clients::{ConsensusClient, ExecutionClient};
use steward_common::local_api::HttpLocalApi;
use steward_common::package_manager::AptPackageManager;
use steward_common::release_feed::GitHubReleaseFeed;
use steward_common::service_probe::SystemctlServiceManager;
use steward_common::signature::GpgVerifier;
use steward_common::sync_check::wait_for_sync;
use steward_common::upgrade::{TarExtractor, Upgrader};
use steward_common::version_probe::SystemBinaryInspector;
use steward_common::{
    CycleOutcome, MaintenanceOrchestrator, PromptOutcome, Session, StewardConfig,
    SystemActionExecutor, VersionProbe,
};
use tracing::info;

/// Real collaborators, built once per invocation
struct System {
    services: SystemctlServiceManager,
    packages: AptPackageManager,
    releases: GitHubReleaseFeed,
    local_api: HttpLocalApi,
    binaries: SystemBinaryInspector,
    extractor: TarExtractor,
}

impl System {
    fn new(config: &StewardConfig) -> Result<Self> {
        let endpoints = &config.endpoints;
        Ok(Self {
            services: SystemctlServiceManager::new(),
            packages: AptPackageManager::new(),
            releases: GitHubReleaseFeed::new(
                endpoints.github_api_url.clone(),
                endpoints.github_api_version.clone(),
            )?,
            local_api: HttpLocalApi::new(
                endpoints.execution_rpc_url.clone(),
                endpoints.beacon_api_url.clone(),
            )?,
            binaries: SystemBinaryInspector,
            extractor: TarExtractor,
        })
    }

    /// Wire the orchestrator over these collaborators and hand it to `f`
    fn with_orchestrator<T>(
        &self,
        config: &StewardConfig,
        f: impl FnOnce(&MaintenanceOrchestrator<'_>) -> T,
    ) -> T {
        let verifier = GpgVerifier::new(&self.packages);
        let upgrader = Upgrader {
            services: &self.services,
            packages: &self.packages,
            releases: &self.releases,
            verifier: &verifier,
            extractor: &self.extractor,
            settings: config.upgrade_settings(),
        };
        let executor = SystemActionExecutor::new(&self.services, upgrader);
        let orchestrator = MaintenanceOrchestrator {
            probe: self.probe(config),
            services: &self.services,
            executor: &executor,
        };
        f(&orchestrator)
    }

    fn probe(&self, config: &StewardConfig) -> VersionProbe<'_> {
        VersionProbe {
            binaries: &self.binaries,
            local_api: &self.local_api,
            packages: &self.packages,
            releases: &self.releases,
            refresh_package_index: config.probe.refresh_package_index,
        }
    }
}

fn color_enabled() -> bool {
    console::user_attended()
}

fn load_session(config: &StewardConfig) -> Result<Session> {
    Session::load_or_init(&config.paths.session_file).context("Cannot load client selection")
}

pub fn status(config: &StewardConfig, json: bool) -> Result<i32> {
    let session = load_session(config)?;
    let system = System::new(config)?;
    let report =
        system.with_orchestrator(config, |orchestrator| orchestrator.evaluate(&session));
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", dashboard::render(&report, color_enabled()));
    }
    Ok(EXIT_SUCCESS)
}

pub fn maintain(
    config: &StewardConfig,
    assume_yes: bool,
    log_path: Option<PathBuf>,
) -> Result<i32> {
    let session = load_session(config)?;
    info!(
        "Maintaining {} and {}",
        session.execution_client, session.consensus_client
    );

    let system = System::new(config)?;
    let prompt = TerminalPrompt {
        assume_yes,
        color: color_enabled(),
        log_path,
    };

    let outcome =
        system.with_orchestrator(config, |orchestrator| orchestrator.run(&session, &prompt));
    match outcome {
        CycleOutcome::UpToDate(_) => {
            info!("Both clients are up to date");
            Ok(EXIT_SUCCESS)
        }
        CycleOutcome::Quit(_) => {
            info!("Maintenance declined");
            Ok(EXIT_SUCCESS)
        }
        CycleOutcome::Pending(report) => {
            info!(
                "Maintenance left pending: {} / {}",
                report.execution.next_step, report.consensus.next_step
            );
            Ok(EXIT_SUCCESS)
        }
        CycleOutcome::Failed(_) => Ok(EXIT_MAINTENANCE_FAILED),
    }
}

pub fn select(
    config: &StewardConfig,
    execution: Option<ExecutionClient>,
    consensus: Option<ConsensusClient>,
) -> Result<i32> {
    let session = Session::select(&config.paths.session_file, execution, consensus)?;
    println!(
        "Selected clients: {} (execution), {} (consensus)",
        session.execution_client.display_name(),
        session.consensus_client.display_name()
    );
    Ok(EXIT_SUCCESS)
}

pub fn sync(config: &StewardConfig, log_path: Option<PathBuf>) -> Result<i32> {
    let local_api = HttpLocalApi::new(
        config.endpoints.execution_rpc_url.clone(),
        config.endpoints.beacon_api_url.clone(),
    )?;
    let prompt = TerminalPrompt {
        assume_yes: false,
        color: color_enabled(),
        log_path,
    };

    match wait_for_sync(&local_api, &prompt, &config.sync.retry_policy()) {
        PromptOutcome::Success(status) => {
            println!(
                "Beacon node is healthy. Head slot: {}, sync distance: {}, syncing: {}",
                status.head_slot, status.sync_distance, status.is_syncing
            );
            Ok(EXIT_SUCCESS)
        }
        PromptOutcome::Quit | PromptOutcome::Proceed(_) => Ok(crate::errors::EXIT_GENERAL_ERROR),
    }
}
