//! Service probe - is a client's systemd unit registered, and is it running?
//!
//! Sources:
//! - systemctl show <unit> --property=LoadState,ActiveState,SubState
//!
//! A unit counts as running only when it is loaded, active, and its sub-state
//! is exactly "running". "active (activating)" or "active (exited)" do not count.

use crate::command;
use crate::error::{ActionError, ProbeError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Raw unit states as reported by the service manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetails {
    /// e.g. "loaded", "not-found", "masked"
    pub load_state: String,
    /// e.g. "active", "inactive", "failed", "activating"
    pub active_state: String,
    /// e.g. "running", "dead", "exited", "auto-restart"
    pub sub_state: String,
}

impl ServiceDetails {
    pub fn is_loaded(&self) -> bool {
        self.load_state == "loaded"
    }

    pub fn is_running(&self) -> bool {
        self.is_loaded() && self.active_state == "active" && self.sub_state == "running"
    }

    /// Format state for display (e.g., "active (running)")
    pub fn format_state(&self) -> String {
        if self.sub_state.is_empty() {
            self.active_state.clone()
        } else {
            format!("{} ({})", self.active_state, self.sub_state)
        }
    }

    /// Parse `key=value` lines from `systemctl show`
    pub fn parse_show_output(stdout: &str) -> Self {
        let mut details = ServiceDetails::default();
        for line in stdout.lines() {
            if let Some((key, value)) = line.split_once('=') {
                match key {
                    "LoadState" => details.load_state = value.trim().to_string(),
                    "ActiveState" => details.active_state = value.trim().to_string(),
                    "SubState" => details.sub_state = value.trim().to_string(),
                    _ => {}
                }
            }
        }
        details
    }
}

/// Found/running summary for one unit
///
/// `found == false` always implies `running == false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    pub found: bool,
    pub running: bool,
}

impl ServiceState {
    pub fn from_details(details: &ServiceDetails) -> Self {
        let found = details.is_loaded();
        ServiceState {
            found,
            running: found && details.is_running(),
        }
    }

    pub fn missing() -> Self {
        ServiceState::default()
    }

    pub fn running() -> Self {
        ServiceState {
            found: true,
            running: true,
        }
    }

    pub fn stopped() -> Self {
        ServiceState {
            found: true,
            running: false,
        }
    }
}

/// Service manager capability
///
/// Verbs take several unit names so that paired units (beacon node and
/// validator client) transition in a single call.
pub trait ServiceManager {
    fn query(&self, unit: &str) -> Result<ServiceDetails, ProbeError>;
    fn start(&self, units: &[&str]) -> Result<(), ActionError>;
    fn stop(&self, units: &[&str]) -> Result<(), ActionError>;
    fn restart(&self, units: &[&str]) -> Result<(), ActionError>;
}

/// systemd backend
#[derive(Debug, Default)]
pub struct SystemctlServiceManager;

impl SystemctlServiceManager {
    pub fn new() -> Self {
        Self
    }

    fn verb(&self, verb: &str, units: &[&str]) -> Result<(), ActionError> {
        let mut args = vec![verb];
        args.extend_from_slice(units);
        info!("systemctl {} {}", verb, units.join(" "));
        command::run("systemctl", &args).map(|_| ())
    }
}

impl ServiceManager for SystemctlServiceManager {
    fn query(&self, unit: &str) -> Result<ServiceDetails, ProbeError> {
        let stdout = command::query(
            "systemctl",
            &["show", unit, "--property=LoadState,ActiveState,SubState"],
        )?;
        Ok(ServiceDetails::parse_show_output(&stdout))
    }

    fn start(&self, units: &[&str]) -> Result<(), ActionError> {
        self.verb("start", units)
    }

    fn stop(&self, units: &[&str]) -> Result<(), ActionError> {
        self.verb("stop", units)
    }

    fn restart(&self, units: &[&str]) -> Result<(), ActionError> {
        self.verb("restart", units)
    }
}

/// Probe one unit; a failed query is reported as a missing service
pub fn probe_service(manager: &dyn ServiceManager, unit: &str) -> ServiceState {
    match manager.query(unit) {
        Ok(details) => {
            let state = ServiceState::from_details(&details);
            info!(
                "Service {} is {} (load: {})",
                unit,
                details.format_state(),
                details.load_state
            );
            state
        }
        Err(e) => {
            warn!("Unable to query service {}: {}", unit, e);
            ServiceState::missing()
        }
    }
}
