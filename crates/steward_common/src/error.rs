//! Error types for probes and maintenance actions.

use thiserror::Error;

/// Failure of a single probe query
///
/// Never leaves the probe layer: every probe failure degrades the field it
/// was computing to `Unknown` after being logged.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to run {command}: {source}")]
    Exec {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {code}")]
    ExitStatus { command: String, code: String },

    #[error("Cannot connect to {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Unexpected status code from {url}: {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unexpected response from {url}: {message}")]
    Response { url: String, message: String },
}

/// Failure of a maintenance action against one client
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Failed to run {command}: {source}")]
    Exec {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Release {tag} has no asset ending in {suffix}")]
    MissingAsset { tag: String, suffix: String },

    #[error("Signature verification failed for {path}. Stopping here to protect you.")]
    BadSignature { path: String },

    #[error("Could not receive signing key {key_id} after {attempts} attempts: {last_error}")]
    KeyUnavailable {
        key_id: String,
        attempts: u32,
        last_error: String,
    },

    #[error("{action} is not implemented for {client}")]
    NotImplemented { action: String, client: String },

    #[error("{0}")]
    Query(#[from] ProbeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ActionError {
    /// Short machine-friendly code for logs and JSON output
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::Exec { .. } => "exec",
            ActionError::CommandFailed { .. } => "command_failed",
            ActionError::Http { .. } => "http",
            ActionError::MissingAsset { .. } => "missing_asset",
            ActionError::BadSignature { .. } => "bad_signature",
            ActionError::KeyUnavailable { .. } => "key_unavailable",
            ActionError::NotImplemented { .. } => "not_implemented",
            ActionError::Query(_) => "query",
            ActionError::Io(_) => "io",
        }
    }
}

/// Render an exit status without assuming a code exists (signals on unix)
pub(crate) fn exit_code_label(status: &std::process::ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
