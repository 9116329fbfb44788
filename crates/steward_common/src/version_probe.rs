//! Version probe - installed, running, available and latest versions per client
//!
//! Four independent queries:
//! - installed: the client binary's own version flag
//! - running:   the live process's loopback API
//! - available: the package manager candidate (package-distributed clients only)
//! - latest:    the upstream release feed
//!
//! Any failure degrades that one field to `Unknown` and is logged. Nothing
//! here retries and nothing here returns an error to the caller.

use crate::clients::{ConsensusClient, Distribution, ExecutionClient};
use crate::command;
use crate::error::ProbeError;
use crate::local_api::LocalClientApi;
use crate::package_manager::PackageManager;
use crate::release_feed::ReleaseFeed;
use crate::version::ProbedVersion;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// The four version fields for one client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientVersionSet {
    pub installed: ProbedVersion,
    pub running: ProbedVersion,
    pub available: ProbedVersion,
    pub latest: ProbedVersion,
}

impl ClientVersionSet {
    /// Versions from strings, for fixtures and tests ("unknown" or "" for the sentinel)
    pub fn from_strs(installed: &str, running: &str, available: &str, latest: &str) -> Self {
        Self {
            installed: ProbedVersion::parse(installed),
            running: ProbedVersion::parse(running),
            available: ProbedVersion::parse(available),
            latest: ProbedVersion::parse(latest),
        }
    }
}

/// Runs a local binary and returns its stdout
pub trait BinaryInspector {
    fn version_output(&self, program: &str, args: &[&str]) -> Result<String, ProbeError>;
}

#[derive(Debug, Default)]
pub struct SystemBinaryInspector;

impl BinaryInspector for SystemBinaryInspector {
    fn version_output(&self, program: &str, args: &[&str]) -> Result<String, ProbeError> {
        command::query(program, args)
    }
}

/// Collaborators needed to fill a `ClientVersionSet`
pub struct VersionProbe<'a> {
    pub binaries: &'a dyn BinaryInspector,
    pub local_api: &'a dyn LocalClientApi,
    pub packages: &'a dyn PackageManager,
    pub releases: &'a dyn ReleaseFeed,
    /// Refresh the package index before reading the candidate version
    pub refresh_package_index: bool,
}

impl<'a> VersionProbe<'a> {
    pub fn probe_execution(&self, client: ExecutionClient) -> ClientVersionSet {
        let name = client.display_name();

        info!("Getting {} installed version...", name);
        let installed = match self
            .binaries
            .version_output(client.binary(), client.version_args())
        {
            Ok(output) => client.parse_installed(&output),
            Err(e) => {
                error!("Unable to get {} installed version: {}", name, e);
                ProbedVersion::Unknown
            }
        };

        info!("Getting {} running version...", name);
        let running = match self.local_api.execution_client_version() {
            Ok(agent) => client.parse_running(&agent),
            Err(e) => {
                error!("Unable to get {} running version: {}", name, e);
                ProbedVersion::Unknown
            }
        };

        let available = match client.distribution() {
            Distribution::Package { package } => self.available_version(name, package),
            Distribution::ReleaseArchive { .. } => ProbedVersion::Unknown,
        };

        let latest = self.latest_version(name, client.upstream_repo());

        let versions = ClientVersionSet {
            installed,
            running,
            available,
            latest,
        };
        log_versions(name, &versions);
        versions
    }

    pub fn probe_consensus(&self, client: ConsensusClient) -> ClientVersionSet {
        let name = client.display_name();

        info!("Getting {} installed version...", name);
        let installed = match self
            .binaries
            .version_output(client.binary(), client.version_args())
        {
            Ok(output) => client.parse_installed(&output),
            Err(e) => {
                error!("Unable to get {} installed version: {}", name, e);
                ProbedVersion::Unknown
            }
        };

        info!("Getting {} running version...", name);
        let running = match self.local_api.beacon_node_version() {
            Ok(agent) => client.parse_running(&agent),
            Err(e) => {
                error!("Unable to get {} running version: {}", name, e);
                ProbedVersion::Unknown
            }
        };

        let latest = self.latest_version(name, client.upstream_repo());

        let versions = ClientVersionSet {
            installed,
            running,
            available: ProbedVersion::Unknown,
            latest,
        };
        log_versions(name, &versions);
        versions
    }

    fn available_version(&self, name: &str, package: &str) -> ProbedVersion {
        info!("Getting {} available version...", name);
        if self.refresh_package_index {
            if let Err(e) = self.packages.refresh_index() {
                warn!("Package index refresh failed, candidate may be stale: {}", e);
            }
        }
        self.packages.candidate_version(package)
    }

    fn latest_version(&self, name: &str, repo: &str) -> ProbedVersion {
        info!("Getting {} latest version...", name);
        match self.releases.latest_release(repo) {
            Ok(release) => {
                let latest = ProbedVersion::parse(release.version());
                if !latest.is_known() {
                    error!("Cannot parse tag name {} for {} version", release.tag_name, name);
                }
                latest
            }
            Err(e) => {
                error!("Unable to get the latest stable version for {}: {}", name, e);
                ProbedVersion::Unknown
            }
        }
    }
}

fn log_versions(name: &str, versions: &ClientVersionSet) {
    info!(
        "{} versions - installed: {}, running: {}, available: {}, latest: {}",
        name, versions.installed, versions.running, versions.available, versions.latest
    );
}
