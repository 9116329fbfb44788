//! Node Steward configuration
//!
//! Lives in /etc/node-steward/config.toml. A missing file means defaults,
//! and every field has a serde default so partial files are fine.

use crate::retry::{Backoff, RetryPolicy};
use crate::upgrade::UpgradeSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SYSTEM_CONFIG_DIR: &str = "/etc/node-steward";
const CONFIG_FILE: &str = "config.toml";

/// State directory (session file, downloads)
pub const DATA_DIR: &str = "/var/lib/node-steward";

const MAX_ATTEMPTS: u32 = 50;
const MAX_DELAY_SECS: u64 = 300;

/// Loopback and upstream endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Execution client JSON-RPC
    #[serde(default = "default_execution_rpc_url")]
    pub execution_rpc_url: String,

    /// Beacon node REST API
    #[serde(default = "default_beacon_api_url")]
    pub beacon_api_url: String,

    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Sent as the Accept header on release feed requests
    #[serde(default = "default_github_api_version")]
    pub github_api_version: String,
}

fn default_execution_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_beacon_api_url() -> String {
    "http://127.0.0.1:5052".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_api_version() -> String {
    "application/vnd.github.v3+json".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            execution_rpc_url: default_execution_rpc_url(),
            beacon_api_url: default_beacon_api_url(),
            github_api_url: default_github_api_url(),
            github_api_version: default_github_api_version(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Where release archives are downloaded before verification
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Overrides the consensus client's install directory
    #[serde(default)]
    pub consensus_install_dir: Option<PathBuf>,

    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(DATA_DIR).join("downloads")
}

fn default_session_file() -> PathBuf {
    PathBuf::from(DATA_DIR).join("session.json")
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            consensus_install_dir: None,
            session_file: default_session_file(),
        }
    }
}

/// PGP key server mirrors, tried in order and rotated on failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyServerConfig {
    #[serde(default = "default_key_servers")]
    pub servers: Vec<String>,

    /// Total attempts across all mirrors (valid: 1-50)
    #[serde(default = "default_key_attempts")]
    pub max_attempts: u32,

    /// Seconds between attempts (valid: 0-300)
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,
}

fn default_key_servers() -> Vec<String> {
    vec![
        "hkps://keys.openpgp.org".to_string(),
        "hkps://keyserver.ubuntu.com".to_string(),
        "hkps://pgp.mit.edu".to_string(),
    ]
}

fn default_key_attempts() -> u32 {
    15
}

fn default_retry_delay() -> u64 {
    5
}

impl KeyServerConfig {
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS)
    }

    pub fn effective_delay_secs(&self) -> u64 {
        self.delay_secs.min(MAX_DELAY_SECS)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.effective_max_attempts(),
            Duration::from_secs(self.effective_delay_secs()),
        )
    }
}

impl Default for KeyServerConfig {
    fn default() -> Self {
        Self {
            servers: default_key_servers(),
            max_attempts: default_key_attempts(),
            delay_secs: default_retry_delay(),
        }
    }
}

/// Beacon sync check retries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// (valid: 1-50)
    #[serde(default = "default_sync_attempts")]
    pub max_attempts: u32,

    /// (valid: 0-300)
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,

    #[serde(default)]
    pub backoff: Backoff,
}

fn default_sync_attempts() -> u32 {
    5
}

impl SyncConfig {
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS)
    }

    pub fn effective_delay_secs(&self) -> u64 {
        self.delay_secs.min(MAX_DELAY_SECS)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_secs(self.effective_delay_secs());
        match self.backoff {
            Backoff::Fixed => RetryPolicy::fixed(self.effective_max_attempts(), delay),
            Backoff::Exponential => RetryPolicy::exponential(self.effective_max_attempts(), delay),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_sync_attempts(),
            delay_secs: default_retry_delay(),
            backoff: Backoff::Fixed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Run a package index refresh before reading the candidate version
    #[serde(default = "default_true")]
    pub refresh_package_index: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            refresh_package_index: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StewardConfig {
    #[serde(default)]
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub keyservers: KeyServerConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl StewardConfig {
    /// Load from `path`; a missing file yields defaults, a broken one is an error
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn upgrade_settings(&self) -> UpgradeSettings {
        UpgradeSettings {
            download_dir: self.paths.download_dir.clone(),
            install_dir_override: self.paths.consensus_install_dir.clone(),
            key_servers: self.keyservers.servers.clone(),
            key_retry: self.keyservers.retry_policy(),
        }
    }
}

pub fn config_path() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE)
}
