//! In-memory collaborators for driving the probe, upgrader and orchestrator

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

use steward_common::clients::ClientId;
use steward_common::local_api::{LocalClientApi, SyncStatus};
use steward_common::package_manager::PackageManager;
use steward_common::prompt::{MenuChoice, PromptOutcome, UserPrompt};
use steward_common::release_feed::{Release, ReleaseAsset, ReleaseFeed};
use steward_common::signature::SignatureVerifier;
use steward_common::upgrade::ArchiveExtractor;
use steward_common::version_probe::BinaryInspector;
use steward_common::{
    ActionError, ActionExecutor, DashboardReport, ProbeError, ProbedVersion, ServiceDetails,
    ServiceManager,
};

pub const GETH_UNIT: &str = "geth.service";
pub const BEACON_UNIT: &str = "lighthousebeacon.service";
pub const VALIDATOR_UNIT: &str = "lighthousevalidator.service";

pub fn geth_version_output(version: &str) -> String {
    format!(
        "Geth\nVersion: {}-stable\nGit Commit: 6c4dc6c38827296dec5a49a6ea25fd7f0eb4ac77\nArchitecture: amd64\nGo Version: go1.17.2\n",
        version
    )
}

pub fn geth_agent(version: &str) -> String {
    format!("Geth/v{}-stable-6c4dc6c3/linux-amd64/go1.17.2", version)
}

pub fn lighthouse_version_output(version: &str) -> String {
    format!(
        "Lighthouse v{}-fff01b2\nBLS library: blst\nSHA256 hardware acceleration: true\n",
        version
    )
}

pub fn lighthouse_agent(version: &str) -> String {
    format!("Lighthouse/v{}-fff01b2/x86_64-linux", version)
}

fn details(load: &str, active: &str, sub: &str) -> ServiceDetails {
    ServiceDetails {
        load_state: load.to_string(),
        active_state: active.to_string(),
        sub_state: sub.to_string(),
    }
}

/// Unit table plus a log of every mutating call
///
/// `start` and `restart` flip the units to running, like the real thing.
#[derive(Default)]
pub struct FakeServices {
    pub units: RefCell<HashMap<String, ServiceDetails>>,
    pub calls: RefCell<Vec<String>>,
    pub fail_verb: Option<&'static str>,
}

impl FakeServices {
    pub fn with_running(units: &[&str]) -> Self {
        let services = FakeServices::default();
        for unit in units {
            services.set_running(unit);
        }
        services
    }

    pub fn set_running(&self, unit: &str) {
        self.units
            .borrow_mut()
            .insert(unit.to_string(), details("loaded", "active", "running"));
    }

    pub fn set_stopped(&self, unit: &str) {
        self.units
            .borrow_mut()
            .insert(unit.to_string(), details("loaded", "inactive", "dead"));
    }

    pub fn set_activating(&self, unit: &str) {
        self.units
            .borrow_mut()
            .insert(unit.to_string(), details("loaded", "active", "activating"));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, verb: &str, units: &[&str]) -> Result<(), ActionError> {
        self.calls
            .borrow_mut()
            .push(format!("{} {}", verb, units.join(" ")));
        if self.fail_verb == Some(verb) {
            return Err(ActionError::CommandFailed {
                command: format!("systemctl {} {}", verb, units.join(" ")),
                code: "exit code 1".to_string(),
                stderr: "Job failed".to_string(),
            });
        }
        Ok(())
    }
}

impl ServiceManager for FakeServices {
    fn query(&self, unit: &str) -> Result<ServiceDetails, ProbeError> {
        Ok(self
            .units
            .borrow()
            .get(unit)
            .cloned()
            .unwrap_or_else(|| details("not-found", "inactive", "dead")))
    }

    fn start(&self, units: &[&str]) -> Result<(), ActionError> {
        self.record("start", units)?;
        for unit in units {
            self.set_running(unit);
        }
        Ok(())
    }

    fn stop(&self, units: &[&str]) -> Result<(), ActionError> {
        self.record("stop", units)?;
        for unit in units {
            self.set_stopped(unit);
        }
        Ok(())
    }

    fn restart(&self, units: &[&str]) -> Result<(), ActionError> {
        self.record("restart", units)?;
        for unit in units {
            self.set_running(unit);
        }
        Ok(())
    }
}

/// Binary stdout by program name; absent programs fail to exec
#[derive(Default)]
pub struct FakeBinaries {
    pub outputs: RefCell<HashMap<String, String>>,
}

impl FakeBinaries {
    pub fn with(program: &str, output: String) -> Self {
        let binaries = FakeBinaries::default();
        binaries.set(program, output);
        binaries
    }

    pub fn set(&self, program: &str, output: String) {
        self.outputs.borrow_mut().insert(program.to_string(), output);
    }
}

impl BinaryInspector for FakeBinaries {
    fn version_output(&self, program: &str, _args: &[&str]) -> Result<String, ProbeError> {
        self.outputs
            .borrow()
            .get(program)
            .cloned()
            .ok_or_else(|| ProbeError::Exec {
                command: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
    }
}

fn refused(url: &str) -> ProbeError {
    ProbeError::Connection {
        url: url.to_string(),
        message: "connection refused".to_string(),
    }
}

/// Agent strings for the running processes; `None` means unreachable
#[derive(Default)]
pub struct FakeLocalApi {
    pub execution_agent: RefCell<Option<String>>,
    pub beacon_agent: RefCell<Option<String>>,
    /// Consumed front to back; an empty queue is a refused connection
    pub sync_responses: RefCell<VecDeque<Result<Option<SyncStatus>, ProbeError>>>,
    pub sync_queries: RefCell<u32>,
}

impl FakeLocalApi {
    pub fn new(execution_agent: Option<String>, beacon_agent: Option<String>) -> Self {
        FakeLocalApi {
            execution_agent: RefCell::new(execution_agent),
            beacon_agent: RefCell::new(beacon_agent),
            ..Default::default()
        }
    }

    pub fn queue_sync(&self, response: Result<Option<SyncStatus>, ProbeError>) {
        self.sync_responses.borrow_mut().push_back(response);
    }
}

impl LocalClientApi for FakeLocalApi {
    fn execution_client_version(&self) -> Result<String, ProbeError> {
        self.execution_agent
            .borrow()
            .clone()
            .ok_or_else(|| refused("http://127.0.0.1:8545"))
    }

    fn beacon_node_version(&self) -> Result<String, ProbeError> {
        self.beacon_agent
            .borrow()
            .clone()
            .ok_or_else(|| refused("http://127.0.0.1:5052/eth/v1/node/version"))
    }

    fn beacon_sync_status(&self) -> Result<Option<SyncStatus>, ProbeError> {
        *self.sync_queries.borrow_mut() += 1;
        self.sync_responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(refused("http://127.0.0.1:5052/eth/v1/node/syncing")))
    }
}

/// Package candidates and an install log
#[derive(Default)]
pub struct FakePackages {
    pub candidates: RefCell<HashMap<String, String>>,
    pub installed: RefCell<Vec<String>>,
    pub calls: RefCell<Vec<String>>,
    pub fail_refresh: bool,
}

impl FakePackages {
    pub fn with_candidate(package: &str, version: &str) -> Self {
        let packages = FakePackages::default();
        packages
            .candidates
            .borrow_mut()
            .insert(package.to_string(), version.to_string());
        packages
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl PackageManager for FakePackages {
    fn refresh_index(&self) -> Result<(), ActionError> {
        self.calls.borrow_mut().push("refresh".to_string());
        if self.fail_refresh {
            return Err(ActionError::CommandFailed {
                command: "apt -y update".to_string(),
                code: "exit code 100".to_string(),
                stderr: "Temporary failure resolving".to_string(),
            });
        }
        Ok(())
    }

    fn candidate_version(&self, package: &str) -> ProbedVersion {
        self.candidates
            .borrow()
            .get(package)
            .map(|v| ProbedVersion::parse(v))
            .unwrap_or_default()
    }

    fn install_latest(&self, package: &str) -> Result<(), ActionError> {
        self.calls.borrow_mut().push(format!("install {}", package));
        self.installed.borrow_mut().push(package.to_string());
        Ok(())
    }

    fn is_installed(&self, package: &str) -> Result<bool, ProbeError> {
        Ok(self.installed.borrow().iter().any(|p| p == package))
    }
}

/// Releases keyed by repo; downloads write the URL into the file
#[derive(Default)]
pub struct FakeReleases {
    pub releases: HashMap<String, Release>,
    pub downloads: RefCell<Vec<String>>,
}

impl FakeReleases {
    pub fn with(repo: &str, tag: &str) -> Self {
        let mut releases = FakeReleases::default();
        releases.releases.insert(repo.to_string(), release(tag, &[]));
        releases
    }

    pub fn insert(&mut self, repo: &str, release: Release) {
        self.releases.insert(repo.to_string(), release);
    }
}

pub fn release(tag: &str, asset_names: &[&str]) -> Release {
    Release {
        tag_name: tag.to_string(),
        assets: asset_names
            .iter()
            .map(|name| ReleaseAsset {
                name: name.to_string(),
                browser_download_url: format!("https://example.invalid/{}/{}", tag, name),
            })
            .collect(),
    }
}

pub fn lighthouse_release(tag: &str) -> Release {
    release(
        tag,
        &[
            &format!("lighthouse-{}-aarch64-unknown-linux-gnu.tar.gz", tag),
            &format!("lighthouse-{}-x86_64-unknown-linux-gnu.tar.gz", tag),
            &format!("lighthouse-{}-x86_64-unknown-linux-gnu.tar.gz.asc", tag),
        ],
    )
}

impl ReleaseFeed for FakeReleases {
    fn latest_release(&self, repo: &str) -> Result<Release, ProbeError> {
        self.releases
            .get(repo)
            .cloned()
            .ok_or_else(|| ProbeError::HttpStatus {
                url: format!("https://api.github.com/repos/{}/releases/latest", repo),
                status: 404,
            })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), ActionError> {
        self.downloads.borrow_mut().push(url.to_string());
        fs::write(dest, url)?;
        Ok(())
    }
}

/// Keyring that accepts keys only from listed servers
#[derive(Default)]
pub struct FakeVerifier {
    pub has_key: bool,
    pub good_servers: Vec<String>,
    pub signature_valid: bool,
    /// Key that made the signature; `None` means the requested key
    pub signer: Option<String>,
    pub verified_with: RefCell<Vec<String>>,
    pub key_requests: RefCell<Vec<String>>,
    pub verified: RefCell<Vec<String>>,
}

impl SignatureVerifier for FakeVerifier {
    fn has_key(&self, _key_id: &str) -> bool {
        self.has_key
    }

    fn receive_key(&self, key_server: &str, key_id: &str) -> Result<(), ActionError> {
        self.key_requests.borrow_mut().push(key_server.to_string());
        if self.good_servers.iter().any(|s| s == key_server) {
            Ok(())
        } else {
            Err(ActionError::CommandFailed {
                command: format!("gpg --keyserver {} --recv-keys {}", key_server, key_id),
                code: "exit code 2".to_string(),
                stderr: "keyserver receive failed".to_string(),
            })
        }
    }

    fn verify(&self, signature: &Path, key_id: &str) -> Result<(), ActionError> {
        self.verified
            .borrow_mut()
            .push(signature.display().to_string());
        self.verified_with.borrow_mut().push(key_id.to_string());
        // The archive must still be on disk next to its signature
        let archive = signature.with_extension("");
        assert!(archive.exists(), "archive missing during verification");
        let right_signer = self.signer.as_deref().map_or(true, |signer| signer == key_id);
        if self.signature_valid && right_signer {
            Ok(())
        } else {
            Err(ActionError::BadSignature {
                path: signature.display().to_string(),
            })
        }
    }
}

#[derive(Default)]
pub struct FakeExtractor {
    pub extracted: RefCell<Vec<(String, String)>>,
    pub fail: bool,
}

impl ArchiveExtractor for FakeExtractor {
    fn extract(&self, archive: &Path, directory: &Path) -> Result<(), ActionError> {
        if self.fail {
            return Err(ActionError::CommandFailed {
                command: format!("tar xf {}", archive.display()),
                code: "exit code 2".to_string(),
                stderr: "Unexpected EOF in archive".to_string(),
            });
        }
        self.extracted.borrow_mut().push((
            archive.display().to_string(),
            directory.display().to_string(),
        ));
        Ok(())
    }
}

/// Executor that forwards service verbs to `FakeServices` and records upgrades
pub struct FakeExecutor<'a> {
    pub services: &'a FakeServices,
    pub upgrades: RefCell<Vec<ClientId>>,
    pub failing_upgrade: Option<ClientId>,
}

impl<'a> FakeExecutor<'a> {
    pub fn new(services: &'a FakeServices) -> Self {
        FakeExecutor {
            services,
            upgrades: RefCell::new(Vec::new()),
            failing_upgrade: None,
        }
    }
}

impl<'a> ActionExecutor for FakeExecutor<'a> {
    fn start(&self, services: &[&str]) -> Result<(), ActionError> {
        self.services.start(services)
    }

    fn stop(&self, services: &[&str]) -> Result<(), ActionError> {
        self.services.stop(services)
    }

    fn restart(&self, services: &[&str]) -> Result<(), ActionError> {
        self.services.restart(services)
    }

    fn upgrade(&self, client: ClientId) -> Result<(), ActionError> {
        self.upgrades.borrow_mut().push(client);
        if self.failing_upgrade == Some(client) {
            return Err(ActionError::Http {
                url: "https://example.invalid".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    fn reinstall(&self, client: ClientId) -> Result<(), ActionError> {
        Err(ActionError::NotImplemented {
            action: "reinstall".to_string(),
            client: client.display_name().to_string(),
        })
    }
}

/// Prompt that answers from a script and records what it was shown
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<PromptOutcome<()>>>,
    pub confirmations: RefCell<u32>,
    pub dashboards: RefCell<u32>,
    pub retries_offered: RefCell<u32>,
    pub failures: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: Vec<PromptOutcome<()>>) -> Self {
        ScriptedPrompt {
            answers: RefCell::new(answers.into()),
            confirmations: RefCell::new(0),
            dashboards: RefCell::new(0),
            retries_offered: RefCell::new(0),
            failures: RefCell::new(Vec::new()),
        }
    }

    pub fn always_maintain() -> Self {
        ScriptedPrompt::new(vec![PromptOutcome::Proceed(MenuChoice::Maintain); 10])
    }

    fn next(&self) -> PromptOutcome<()> {
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(PromptOutcome::Quit)
    }
}

impl UserPrompt for ScriptedPrompt {
    fn confirm_maintenance(&self, report: &DashboardReport) -> PromptOutcome<()> {
        assert!(report.maintenance_needed);
        *self.confirmations.borrow_mut() += 1;
        self.next()
    }

    fn show_dashboard(&self, _report: &DashboardReport) {
        *self.dashboards.borrow_mut() += 1;
    }

    fn offer_retry(&self, _title: &str, _details: &str) -> PromptOutcome<()> {
        *self.retries_offered.borrow_mut() += 1;
        self.next()
    }

    fn report_failure(&self, title: &str, details: &str) {
        self.failures
            .borrow_mut()
            .push(format!("{}: {}", title, details));
    }
}

/// A full set of fakes describing one node
pub struct World {
    pub services: FakeServices,
    pub binaries: FakeBinaries,
    pub local_api: FakeLocalApi,
    pub packages: FakePackages,
    pub releases: FakeReleases,
}

impl World {
    /// Geth and Lighthouse installed, running and current
    pub fn healthy() -> Self {
        let binaries = FakeBinaries::with("geth", geth_version_output("1.10.13"));
        binaries.set(
            "/usr/local/bin/lighthouse",
            lighthouse_version_output("2.0.1"),
        );

        let mut releases = FakeReleases::with("ethereum/go-ethereum", "v1.10.13");
        releases.insert("sigp/lighthouse", lighthouse_release("v2.0.1"));

        World {
            services: FakeServices::with_running(&[GETH_UNIT, BEACON_UNIT, VALIDATOR_UNIT]),
            binaries,
            local_api: FakeLocalApi::new(
                Some(geth_agent("1.10.13")),
                Some(lighthouse_agent("2.0.1")),
            ),
            packages: FakePackages::with_candidate("geth", "1.10.13+build27008+focal"),
            releases,
        }
    }

    pub fn probe(&self) -> steward_common::VersionProbe<'_> {
        steward_common::VersionProbe {
            binaries: &self.binaries,
            local_api: &self.local_api,
            packages: &self.packages,
            releases: &self.releases,
            refresh_package_index: false,
        }
    }

    pub fn orchestrator<'a>(
        &'a self,
        executor: &'a dyn ActionExecutor,
    ) -> steward_common::MaintenanceOrchestrator<'a> {
        steward_common::MaintenanceOrchestrator {
            probe: self.probe(),
            services: &self.services,
            executor,
        }
    }
}
