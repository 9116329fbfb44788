//! Thin wrappers around `std::process::Command` shared by the system backends

use crate::error::{exit_code_label, ActionError, ProbeError};
use std::process::{Command, Output};
use tracing::debug;

fn render(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Run a read-only query command, returning stdout on success
pub fn query(program: &str, args: &[&str]) -> Result<String, ProbeError> {
    let command = render(program, args);
    debug!("Running {}", command);

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ProbeError::Exec {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ProbeError::ExitStatus {
            command,
            code: exit_code_label(&output.status),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Run a mutating command, failing on a non-zero exit
pub fn run(program: &str, args: &[&str]) -> Result<Output, ActionError> {
    let command = render(program, args);
    debug!("Running {}", command);

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ActionError::Exec {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ActionError::CommandFailed {
            command,
            code: exit_code_label(&output.status),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
