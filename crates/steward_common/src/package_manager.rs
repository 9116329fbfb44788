//! Package manager capability (apt on Ubuntu)
//!
//! Only package-distributed clients go through here. The candidate version is
//! what `apt` would install right now, which can lag behind the upstream
//! release while the PPA catches up.

use crate::command;
use crate::error::{ActionError, ProbeError};
use crate::version::ProbedVersion;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

/// `Candidate: [epoch:]upstream[+build...]`
static APT_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Candidate: (?:\d+:)?(?P<version>[^+\s]+)").unwrap());

/// Debian revision such as `-1` or `-0ubuntu2`
static DEBIAN_REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d[\w.~]*$").unwrap());

pub trait PackageManager {
    /// Refresh the package index so candidates reflect the repositories
    fn refresh_index(&self) -> Result<(), ActionError>;

    /// Version the package manager would install right now
    fn candidate_version(&self, package: &str) -> ProbedVersion;

    fn install_latest(&self, package: &str) -> Result<(), ActionError>;

    fn is_installed(&self, package: &str) -> Result<bool, ProbeError>;
}

#[derive(Debug, Default)]
pub struct AptPackageManager;

impl AptPackageManager {
    pub fn new() -> Self {
        Self
    }
}

/// Extract `Candidate: X` from `apt-cache policy` output
///
/// The epoch, Debian revision and `+build` suffixes are packaging details and
/// are dropped, so `1:1.10.13-1` compares equal to upstream `1.10.13`.
pub fn parse_apt_candidate(policy_output: &str) -> ProbedVersion {
    match APT_CANDIDATE
        .captures(policy_output)
        .and_then(|caps| caps.name("version"))
    {
        Some(found) => ProbedVersion::parse(&DEBIAN_REVISION.replace(found.as_str(), "")),
        None => ProbedVersion::Unknown,
    }
}

impl PackageManager for AptPackageManager {
    fn refresh_index(&self) -> Result<(), ActionError> {
        info!("Refreshing apt package index...");
        command::run("apt", &["-y", "update"]).map(|_| ())
    }

    fn candidate_version(&self, package: &str) -> ProbedVersion {
        let stdout = match command::query("apt-cache", &["policy", package]) {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!("Unable to read apt candidate for {}: {}", package, e);
                return ProbedVersion::Unknown;
            }
        };

        let candidate = parse_apt_candidate(&stdout);
        if !candidate.is_known() {
            warn!("Cannot parse apt-cache policy output for {} candidate version", package);
        }
        candidate
    }

    fn install_latest(&self, package: &str) -> Result<(), ActionError> {
        info!("Installing latest {} package...", package);
        command::run("apt", &["-y", "install", package]).map(|_| ())
    }

    fn is_installed(&self, package: &str) -> Result<bool, ProbeError> {
        match command::query("dpkg-query", &["-W", "-f=${Status}", package]) {
            Ok(status) => Ok(status.contains("install ok installed")),
            // dpkg-query exits non-zero for packages it has never seen
            Err(ProbeError::ExitStatus { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
