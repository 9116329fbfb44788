//! Maintenance classifier - one action per client from its probed state
//!
//! Rules run in a fixed order and the last one that fires wins:
//!
//! 1. do nothing
//! 2. available < latest            => check again soon (execution only)
//! 3. a required service not running => start service
//! 4. running < installed           => restart service
//! 5. installed < upgrade target    => upgrade client
//! 6. a required service not found  => reinstall client
//!
//! The upgrade target is the package candidate for execution clients and the
//! upstream release for consensus clients. Comparisons with an unknown side
//! never fire.

use crate::clients::ClientRole;
use crate::service_probe::ServiceState;
use crate::version::ProbedVersion;
use crate::version_probe::ClientVersionSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceAction {
    #[default]
    DoNothing,
    StartService,
    RestartService,
    UpgradeClient,
    CheckAgainSoon,
    ReinstallClient,
}

impl MaintenanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceAction::DoNothing => "do_nothing",
            MaintenanceAction::StartService => "start_service",
            MaintenanceAction::RestartService => "restart_service",
            MaintenanceAction::UpgradeClient => "upgrade_client",
            MaintenanceAction::CheckAgainSoon => "check_again_soon",
            MaintenanceAction::ReinstallClient => "reinstall_client",
        }
    }

    /// Dashboard wording
    pub fn description(&self) -> &'static str {
        match self {
            MaintenanceAction::DoNothing => "Nothing to perform here. Everything is good.",
            MaintenanceAction::RestartService => "Service needs to be restarted.",
            MaintenanceAction::UpgradeClient => "Client needs to be upgraded.",
            MaintenanceAction::CheckAgainSoon => {
                "Check again. Client update should be available soon."
            }
            MaintenanceAction::StartService => "Service needs to be started.",
            MaintenanceAction::ReinstallClient => "Client needs to be reinstalled.",
        }
    }

    /// Whether this action asks the user to do something
    pub fn needs_maintenance(&self) -> bool {
        *self != MaintenanceAction::DoNothing
    }
}

impl fmt::Display for MaintenanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Version the client would move to on upgrade
fn upgrade_target(role: ClientRole, versions: &ClientVersionSet) -> &ProbedVersion {
    match role {
        ClientRole::Execution => &versions.available,
        ClientRole::Consensus => &versions.latest,
    }
}

/// Classify one client. Total: every input yields exactly one action.
pub fn classify(
    role: ClientRole,
    versions: &ClientVersionSet,
    services: &[ServiceState],
) -> MaintenanceAction {
    let mut action = MaintenanceAction::DoNothing;

    // The package repository has not published the newest upstream release yet
    if role == ClientRole::Execution && versions.available.is_older_than(&versions.latest) {
        action = MaintenanceAction::CheckAgainSoon;
    }

    if services.iter().any(|s| !s.running) {
        action = MaintenanceAction::StartService;
    }

    // The binary on disk was upgraded after the process started
    if versions.running.is_older_than(&versions.installed) {
        action = MaintenanceAction::RestartService;
    }

    if versions.installed.is_older_than(upgrade_target(role, versions)) {
        action = MaintenanceAction::UpgradeClient;
    }

    if services.iter().any(|s| !s.found) {
        action = MaintenanceAction::ReinstallClient;
    }

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(installed: &str, running: &str, available: &str, latest: &str) -> ClientVersionSet {
        ClientVersionSet::from_strs(installed, running, available, latest)
    }

    #[test]
    fn test_all_current_does_nothing() {
        let v = versions("1.10.13", "1.10.13", "1.10.13", "1.10.13");
        assert_eq!(
            classify(ClientRole::Execution, &v, &[ServiceState::running()]),
            MaintenanceAction::DoNothing
        );
    }

    #[test]
    fn test_available_behind_latest_checks_again() {
        let v = versions("1.10.12", "1.10.12", "1.10.12", "1.10.13");
        assert_eq!(
            classify(ClientRole::Execution, &v, &[ServiceState::running()]),
            MaintenanceAction::CheckAgainSoon
        );
    }

    #[test]
    fn test_packaged_revision_of_latest_is_current() {
        let policy = "geth:\n  Installed: 1.10.13-1\n  Candidate: 1.10.13-1\n";
        let v = ClientVersionSet {
            available: crate::package_manager::parse_apt_candidate(policy),
            ..versions("1.10.13", "1.10.13", "", "1.10.13")
        };
        assert_eq!(
            classify(ClientRole::Execution, &v, &[ServiceState::running()]),
            MaintenanceAction::DoNothing
        );
    }

    #[test]
    fn test_check_again_is_execution_only() {
        let v = versions("2.0.1", "2.0.1", "2.0.0", "2.0.1");
        let services = [ServiceState::running(), ServiceState::running()];
        assert_eq!(
            classify(ClientRole::Consensus, &v, &services),
            MaintenanceAction::DoNothing
        );
    }

    #[test]
    fn test_stale_process_restarts() {
        let v = versions("1.10.13", "1.10.12", "1.10.13", "1.10.13");
        assert_eq!(
            classify(ClientRole::Execution, &v, &[ServiceState::running()]),
            MaintenanceAction::RestartService
        );
    }

    #[test]
    fn test_stopped_service_starts() {
        let v = versions("1.10.13", "unknown", "1.10.13", "1.10.13");
        assert_eq!(
            classify(ClientRole::Execution, &v, &[ServiceState::stopped()]),
            MaintenanceAction::StartService
        );
    }

    #[test]
    fn test_upgrade_beats_restart_and_start() {
        let v = versions("1.10.12", "1.10.11", "1.10.13", "1.10.13");
        assert_eq!(
            classify(ClientRole::Execution, &v, &[ServiceState::stopped()]),
            MaintenanceAction::UpgradeClient
        );
    }

    #[test]
    fn test_execution_upgrades_to_candidate_not_latest() {
        // Upstream is ahead but apt cannot deliver it yet
        let v = versions("1.10.12", "1.10.12", "1.10.12", "1.10.13");
        assert_ne!(
            classify(ClientRole::Execution, &v, &[ServiceState::running()]),
            MaintenanceAction::UpgradeClient
        );
    }

    #[test]
    fn test_consensus_upgrades_to_latest() {
        let v = versions("2.0.0", "2.0.0", "unknown", "2.0.1");
        let services = [ServiceState::running(), ServiceState::running()];
        assert_eq!(
            classify(ClientRole::Consensus, &v, &services),
            MaintenanceAction::UpgradeClient
        );
    }

    #[test]
    fn test_missing_service_wins() {
        let v = versions("2.0.0", "2.0.0", "unknown", "2.0.1");
        let services = [ServiceState::missing(), ServiceState::running()];
        assert_eq!(
            classify(ClientRole::Consensus, &v, &services),
            MaintenanceAction::ReinstallClient
        );
    }

    #[test]
    fn test_unknown_operands_never_fire() {
        let v = versions("unknown", "unknown", "unknown", "2.0.1");
        let services = [ServiceState::running(), ServiceState::running()];
        assert_eq!(
            classify(ClientRole::Consensus, &v, &services),
            MaintenanceAction::DoNothing
        );
    }
}
