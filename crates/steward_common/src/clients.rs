//! Client catalogue - the execution and consensus clients we know how to maintain
//!
//! Each client is a closed enum variant. Everything client-specific (service
//! names, binaries, banner formats, upstream repositories, signing keys) hangs
//! off the variant so the rest of the crate never matches on strings.

use crate::version::ProbedVersion;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

static GETH_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version: (?P<version>[^-\s]+)").unwrap());
static GETH_AGENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Geth/v(?P<version>[^-/]+)").unwrap());
static LIGHTHOUSE_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Lighthouse v?(?P<version>[^-\s]+)").unwrap());
static LIGHTHOUSE_AGENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Lighthouse/v(?P<version>[^-/]+)").unwrap());

/// Which side of the node a client sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    Execution,
    Consensus,
}

impl ClientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientRole::Execution => "execution",
            ClientRole::Consensus => "consensus",
        }
    }
}

/// Supported execution clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionClient {
    #[default]
    Geth,
}

/// Supported consensus clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusClient {
    #[default]
    Lighthouse,
}

/// How a client binary reaches the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// Installed and upgraded through the system package manager
    Package { package: &'static str },
    /// Installed from a signed upstream release archive
    ReleaseArchive {
        install_dir: &'static str,
        asset_suffix: &'static str,
        signature_suffix: &'static str,
        signing_key: &'static str,
    },
}

/// Either client, for code that handles both uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientId {
    Execution(ExecutionClient),
    Consensus(ConsensusClient),
}

impl ExecutionClient {
    pub const ALL: &'static [ExecutionClient] = &[ExecutionClient::Geth];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionClient::Geth => "geth",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExecutionClient::Geth => "Geth",
        }
    }

    pub fn service_name(&self) -> &'static str {
        match self {
            ExecutionClient::Geth => "geth.service",
        }
    }

    /// Binary that prints the installed version banner
    pub fn binary(&self) -> &'static str {
        match self {
            ExecutionClient::Geth => "geth",
        }
    }

    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            ExecutionClient::Geth => &["version"],
        }
    }

    /// Upstream repository as `owner/name`
    pub fn upstream_repo(&self) -> &'static str {
        match self {
            ExecutionClient::Geth => "ethereum/go-ethereum",
        }
    }

    pub fn distribution(&self) -> Distribution {
        match self {
            ExecutionClient::Geth => Distribution::Package { package: "geth" },
        }
    }

    /// Parse the output of the version command
    ///
    /// Geth prints `Version: 1.10.12-stable` among other lines.
    pub fn parse_installed(&self, output: &str) -> ProbedVersion {
        match self {
            ExecutionClient::Geth => capture_version(&GETH_BANNER, output),
        }
    }

    /// Parse the agent string reported by the running process
    ///
    /// Geth reports `Geth/v1.10.12-stable-6c4dc6c3/linux-amd64/go1.17.2`.
    pub fn parse_running(&self, agent: &str) -> ProbedVersion {
        match self {
            ExecutionClient::Geth => capture_version(&GETH_AGENT, agent),
        }
    }
}

impl ConsensusClient {
    pub const ALL: &'static [ConsensusClient] = &[ConsensusClient::Lighthouse];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusClient::Lighthouse => "lighthouse",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConsensusClient::Lighthouse => "Lighthouse",
        }
    }

    pub fn beacon_service_name(&self) -> &'static str {
        match self {
            ConsensusClient::Lighthouse => "lighthousebeacon.service",
        }
    }

    pub fn validator_service_name(&self) -> &'static str {
        match self {
            ConsensusClient::Lighthouse => "lighthousevalidator.service",
        }
    }

    /// Beacon node then validator client, the order every systemctl call uses
    pub fn service_names(&self) -> [&'static str; 2] {
        [self.beacon_service_name(), self.validator_service_name()]
    }

    pub fn binary(&self) -> &'static str {
        match self {
            ConsensusClient::Lighthouse => "/usr/local/bin/lighthouse",
        }
    }

    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            ConsensusClient::Lighthouse => &["--version"],
        }
    }

    pub fn upstream_repo(&self) -> &'static str {
        match self {
            ConsensusClient::Lighthouse => "sigp/lighthouse",
        }
    }

    pub fn distribution(&self) -> Distribution {
        match self {
            ConsensusClient::Lighthouse => Distribution::ReleaseArchive {
                install_dir: "/usr/local/bin",
                asset_suffix: "x86_64-unknown-linux-gnu.tar.gz",
                signature_suffix: "x86_64-unknown-linux-gnu.tar.gz.asc",
                signing_key: "15E66D941F697E28F49381F426416DC3F30674B0",
            },
        }
    }

    /// Lighthouse prints `Lighthouse v2.0.1-aaa5344` on its first line
    pub fn parse_installed(&self, output: &str) -> ProbedVersion {
        match self {
            ConsensusClient::Lighthouse => capture_version(&LIGHTHOUSE_BANNER, output),
        }
    }

    /// Lighthouse reports `Lighthouse/v2.0.1-aaa5344/x86_64-linux`
    pub fn parse_running(&self, agent: &str) -> ProbedVersion {
        match self {
            ConsensusClient::Lighthouse => capture_version(&LIGHTHOUSE_AGENT, agent),
        }
    }
}

impl ClientId {
    pub fn role(&self) -> ClientRole {
        match self {
            ClientId::Execution(_) => ClientRole::Execution,
            ClientId::Consensus(_) => ClientRole::Consensus,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ClientId::Execution(client) => client.display_name(),
            ClientId::Consensus(client) => client.display_name(),
        }
    }

    pub fn service_names(&self) -> Vec<&'static str> {
        match self {
            ClientId::Execution(client) => vec![client.service_name()],
            ClientId::Consensus(client) => client.service_names().to_vec(),
        }
    }

    pub fn distribution(&self) -> Distribution {
        match self {
            ClientId::Execution(client) => client.distribution(),
            ClientId::Consensus(client) => client.distribution(),
        }
    }

    pub fn upstream_repo(&self) -> &'static str {
        match self {
            ClientId::Execution(client) => client.upstream_repo(),
            ClientId::Consensus(client) => client.upstream_repo(),
        }
    }
}

impl fmt::Display for ExecutionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ConsensusClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ExecutionClient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExecutionClient::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown execution client: {}", s))
    }
}

impl FromStr for ConsensusClient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConsensusClient::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown consensus client: {}", s))
    }
}

/// Run a pattern with a `version` capture group against probe output
fn capture_version(re: &Regex, text: &str) -> ProbedVersion {
    match re.captures(text).and_then(|caps| caps.name("version")) {
        Some(found) => ProbedVersion::parse(found.as_str()),
        None => {
            warn!("Cannot parse a version out of {:?}", text.trim());
            ProbedVersion::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geth_installed_banner() {
        let output = "Geth\nVersion: 1.10.12-stable\nGit Commit: 6c4dc6c38827296dec5a49a6ea25fd7f0eb4ac77\nArchitecture: amd64\n";
        assert_eq!(
            ExecutionClient::Geth.parse_installed(output).to_string(),
            "1.10.12"
        );
    }

    #[test]
    fn test_geth_running_agent() {
        let agent = "Geth/v1.10.12-stable-6c4dc6c3/linux-amd64/go1.17.2";
        assert_eq!(ExecutionClient::Geth.parse_running(agent).to_string(), "1.10.12");
    }

    #[test]
    fn test_lighthouse_banners() {
        let output = "Lighthouse v2.0.1-aaa5344\nBLS library: blst\n";
        assert_eq!(
            ConsensusClient::Lighthouse.parse_installed(output).to_string(),
            "2.0.1"
        );

        let agent = "Lighthouse/v2.0.1-aaa5344/x86_64-linux";
        assert_eq!(
            ConsensusClient::Lighthouse.parse_running(agent).to_string(),
            "2.0.1"
        );
    }

    #[test]
    fn test_unparseable_banner_is_unknown() {
        assert_eq!(
            ExecutionClient::Geth.parse_installed("command not found"),
            ProbedVersion::Unknown
        );
        assert_eq!(
            ConsensusClient::Lighthouse.parse_running("Prysm/v2.0.0"),
            ProbedVersion::Unknown
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Geth".parse::<ExecutionClient>(), Ok(ExecutionClient::Geth));
        assert_eq!(
            "lighthouse".parse::<ConsensusClient>(),
            Ok(ConsensusClient::Lighthouse)
        );
        assert!("nethermind".parse::<ExecutionClient>().is_err());
    }

    #[test]
    fn test_consensus_service_order() {
        let services = ConsensusClient::Lighthouse.service_names();
        assert_eq!(services[0], "lighthousebeacon.service");
        assert_eq!(services[1], "lighthousevalidator.service");
    }
}
