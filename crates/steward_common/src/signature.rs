//! Detached signature verification for release archives (gpg)

use crate::command;
use crate::error::ActionError;
use crate::package_manager::PackageManager;
use crate::retry::RetryPolicy;
use std::path::Path;
use tracing::{info, warn};

pub trait SignatureVerifier {
    /// Is the signing key already in the local keyring?
    fn has_key(&self, key_id: &str) -> bool;

    fn receive_key(&self, key_server: &str, key_id: &str) -> Result<(), ActionError>;

    /// Verify a detached `.asc` signature against the file next to it
    ///
    /// Only a valid signature made by `key_id` is accepted.
    fn verify(&self, signature: &Path, key_id: &str) -> Result<(), ActionError>;
}

/// Did gpg report a valid signature made by `key_id`?
///
/// Reads `--status-fd` output. A `VALIDSIG` line carries the signing key
/// fingerprint first and the primary key fingerprint last; either may match.
/// `key_id` can be a full fingerprint or a long key id.
pub fn signed_by(status: &str, key_id: &str) -> bool {
    let wanted = key_id.trim().to_ascii_uppercase();
    if wanted.len() < 16 {
        return false;
    }

    status
        .lines()
        .filter_map(|line| line.strip_prefix("[GNUPG:] VALIDSIG "))
        .any(|fields| {
            let fields: Vec<&str> = fields.split_whitespace().collect();
            let signing = fields.first();
            let primary = if fields.len() >= 10 { fields.last() } else { None };
            let matched = [signing, primary]
                .into_iter()
                .flatten()
                .any(|fpr| fpr.to_ascii_uppercase().ends_with(&wanted));
            matched
        })
}

/// gpg backend; installs the `gpg` package on first use if missing
pub struct GpgVerifier<'a> {
    packages: &'a dyn PackageManager,
}

impl<'a> GpgVerifier<'a> {
    pub fn new(packages: &'a dyn PackageManager) -> Self {
        Self { packages }
    }

    fn ensure_installed(&self) -> Result<(), ActionError> {
        let installed = self.packages.is_installed("gpg")?;
        if !installed {
            info!("Installing gpg to verify release signatures...");
            self.packages.refresh_index()?;
            self.packages.install_latest("gpg")?;
        }
        Ok(())
    }
}

impl<'a> SignatureVerifier for GpgVerifier<'a> {
    fn has_key(&self, key_id: &str) -> bool {
        command::query("gpg", &["--list-keys", "--with-colons", key_id]).is_ok()
    }

    fn receive_key(&self, key_server: &str, key_id: &str) -> Result<(), ActionError> {
        self.ensure_installed()?;
        info!("Downloading PGP key {} from {} ...", key_id, key_server);
        command::run("gpg", &["--keyserver", key_server, "--recv-keys", key_id]).map(|_| ())
    }

    fn verify(&self, signature: &Path, key_id: &str) -> Result<(), ActionError> {
        self.ensure_installed()?;
        let path = signature.to_string_lossy().to_string();
        let output = match command::run("gpg", &["--status-fd", "1", "--verify", &path]) {
            Ok(output) => output,
            Err(ActionError::CommandFailed { .. }) => {
                return Err(ActionError::BadSignature { path })
            }
            Err(e) => return Err(e),
        };

        if signed_by(&String::from_utf8_lossy(&output.stdout), key_id) {
            Ok(())
        } else {
            warn!("{} is not signed by {}", path, key_id);
            Err(ActionError::BadSignature { path })
        }
    }
}

/// Make sure `key_id` is in the keyring, rotating across `key_servers`
///
/// Attempt `n` uses `key_servers[n % len]`. Fails with `KeyUnavailable` once
/// the policy is exhausted.
pub fn ensure_signing_key(
    verifier: &dyn SignatureVerifier,
    key_id: &str,
    key_servers: &[String],
    policy: &RetryPolicy,
) -> Result<(), ActionError> {
    if verifier.has_key(key_id) {
        return Ok(());
    }

    if key_servers.is_empty() {
        return Err(ActionError::KeyUnavailable {
            key_id: key_id.to_string(),
            attempts: 0,
            last_error: "no key servers configured".to_string(),
        });
    }

    policy
        .run("Receiving signing key", |attempt| {
            let server = &key_servers[attempt as usize % key_servers.len()];
            verifier.receive_key(server, key_id)
        })
        .map_err(|e| ActionError::KeyUnavailable {
            key_id: key_id.to_string(),
            attempts: policy.max_attempts.max(1),
            last_error: e.to_string(),
        })
}
