//! Session - the selected client pairing, persisted between runs
//!
//! Stored in /var/lib/node-steward/session.json by default. The maintenance
//! logic only ever reads it; selection happens through `select` and
//! `load_or_init`.

use crate::clients::{ConsensusClient, ExecutionClient};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk form; either selection may be absent in older files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    execution_client: Option<ExecutionClient>,
    #[serde(default)]
    consensus_client: Option<ConsensusClient>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// The active client pairing: exactly one execution and one consensus client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub execution_client: ExecutionClient,
    pub consensus_client: ConsensusClient,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            execution_client: ExecutionClient::default(),
            consensus_client: ConsensusClient::default(),
            updated_at: None,
        }
    }
}

impl Session {
    /// Load a complete session; absent file or selections are an error
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("No session at {}. Run `stewardctl select` first.", path.display());
        }
        let file = read_session_file(path)?;
        match (file.execution_client, file.consensus_client) {
            (Some(execution_client), Some(consensus_client)) => Ok(Session {
                execution_client,
                consensus_client,
                updated_at: file.updated_at,
            }),
            _ => anyhow::bail!("Session {} is missing a client selection", path.display()),
        }
    }

    /// Load the session, filling missing selections with defaults.
    ///
    /// Persists once if anything had to be filled in, so the defaults become
    /// the recorded choice.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        let file = read_session_file(path)?;
        let filled = file.execution_client.is_none() || file.consensus_client.is_none();

        let session = Session {
            execution_client: file.execution_client.unwrap_or_default(),
            consensus_client: file.consensus_client.unwrap_or_default(),
            updated_at: file.updated_at,
        };

        if filled {
            info!(
                "Using default clients {} and {}",
                session.execution_client, session.consensus_client
            );
            return session.save(path);
        }

        Ok(session)
    }

    /// Record a new selection and persist it
    pub fn select(
        path: &Path,
        execution_client: Option<ExecutionClient>,
        consensus_client: Option<ConsensusClient>,
    ) -> Result<Self> {
        let current = Session::load_or_init(path)?;
        let session = Session {
            execution_client: execution_client.unwrap_or(current.execution_client),
            consensus_client: consensus_client.unwrap_or(current.consensus_client),
            updated_at: current.updated_at,
        };
        session.save(path)
    }

    /// Write atomically, returning the session as saved (with timestamp)
    pub fn save(&self, path: &Path) -> Result<Self> {
        let saved = Session {
            updated_at: Some(Utc::now()),
            ..self.clone()
        };
        let file = SessionFile {
            execution_client: Some(saved.execution_client),
            consensus_client: Some(saved.consensus_client),
            updated_at: saved.updated_at,
        };

        let content =
            serde_json::to_string_pretty(&file).context("Failed to serialize session")?;
        atomic_write(path, &content)
            .with_context(|| format!("Failed to save session to {}", path.display()))?;
        Ok(saved)
    }
}

fn read_session_file(path: &Path) -> Result<SessionFile> {
    if !path.exists() {
        return Ok(SessionFile::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file {}", path.display()))
}

/// Write to a temp file next to `path`, then rename over it
pub fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = PathBuf::from(path);
    tmp.set_extension("json.tmp");

    let mut file = fs::File::create(&tmp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}
