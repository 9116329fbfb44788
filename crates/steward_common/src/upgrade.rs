//! Client upgrade procedures
//!
//! Package-distributed clients:
//! 1. refresh package index
//! 2. install latest package
//! 3. restart service
//!
//! Release-archive clients:
//! 1. fetch latest release metadata
//! 2. locate archive and detached signature by suffix
//! 3. download both
//! 4. make sure the maintainer key is in the keyring (mirror rotation)
//! 5. verify signature - failure stops here, services untouched
//! 6. stop services
//! 7. extract over the install directory
//! 8. start services
//! 9. remove downloads (always, via drop)

use crate::clients::{ClientId, Distribution};
use crate::command;
use crate::error::ActionError;
use crate::package_manager::PackageManager;
use crate::release_feed::{Release, ReleaseAsset, ReleaseFeed};
use crate::retry::RetryPolicy;
use crate::service_probe::ServiceManager;
use crate::signature::{ensure_signing_key, SignatureVerifier};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub trait ArchiveExtractor {
    fn extract(&self, archive: &Path, directory: &Path) -> Result<(), ActionError>;
}

#[derive(Debug, Default)]
pub struct TarExtractor;

impl ArchiveExtractor for TarExtractor {
    fn extract(&self, archive: &Path, directory: &Path) -> Result<(), ActionError> {
        let archive = archive.to_string_lossy();
        let directory = directory.to_string_lossy();
        command::run("tar", &["xf", &archive, "--directory", &directory]).map(|_| ())
    }
}

/// Settings the release-archive path needs
#[derive(Debug, Clone)]
pub struct UpgradeSettings {
    pub download_dir: PathBuf,
    /// Overrides the client's default install directory
    pub install_dir_override: Option<PathBuf>,
    pub key_servers: Vec<String>,
    pub key_retry: RetryPolicy,
}

/// Downloaded files, deleted when dropped whatever the outcome
struct Downloads {
    paths: Vec<PathBuf>,
}

impl Downloads {
    fn new() -> Self {
        Self { paths: Vec::new() }
    }

    fn track(&mut self, path: PathBuf) -> PathBuf {
        self.paths.push(path.clone());
        path
    }
}

impl Drop for Downloads {
    fn drop(&mut self) {
        for path in &self.paths {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Could not remove download leftover {}: {}", path.display(), e);
                }
            }
        }
    }
}

pub struct Upgrader<'a> {
    pub services: &'a dyn ServiceManager,
    pub packages: &'a dyn PackageManager,
    pub releases: &'a dyn ReleaseFeed,
    pub verifier: &'a dyn SignatureVerifier,
    pub extractor: &'a dyn ArchiveExtractor,
    pub settings: UpgradeSettings,
}

impl<'a> Upgrader<'a> {
    pub fn upgrade(&self, client: ClientId) -> Result<(), ActionError> {
        info!("Upgrading {} client...", client.display_name());
        match client.distribution() {
            Distribution::Package { package } => self.upgrade_package(client, package),
            Distribution::ReleaseArchive {
                install_dir,
                asset_suffix,
                signature_suffix,
                signing_key,
            } => {
                let install_dir = self
                    .settings
                    .install_dir_override
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(install_dir));
                self.upgrade_release_archive(
                    client,
                    &install_dir,
                    asset_suffix,
                    signature_suffix,
                    signing_key,
                )
            }
        }
    }

    fn upgrade_package(&self, client: ClientId, package: &str) -> Result<(), ActionError> {
        self.packages.refresh_index()?;
        self.packages.install_latest(package)?;

        info!("Restarting {} service...", client.display_name());
        self.services.restart(&client.service_names())
    }

    fn upgrade_release_archive(
        &self,
        client: ClientId,
        install_dir: &Path,
        asset_suffix: &str,
        signature_suffix: &str,
        signing_key: &str,
    ) -> Result<(), ActionError> {
        let release = self.releases.latest_release(client.upstream_repo())?;
        info!("Latest {} release is {}", client.display_name(), release.tag_name);

        let archive = find_asset(&release, asset_suffix)?;
        let signature = find_asset(&release, signature_suffix)?;

        fs::create_dir_all(&self.settings.download_dir)?;
        let mut downloads = Downloads::new();

        let archive_path = downloads.track(self.settings.download_dir.join(&archive.name));
        self.releases
            .download(&archive.browser_download_url, &archive_path)?;

        let signature_path = downloads.track(self.settings.download_dir.join(&signature.name));
        self.releases
            .download(&signature.browser_download_url, &signature_path)?;

        ensure_signing_key(
            self.verifier,
            signing_key,
            &self.settings.key_servers,
            &self.settings.key_retry,
        )?;

        if let Err(e) = self.verifier.verify(&signature_path, signing_key) {
            error!("The {} binary signature is wrong: {}", client.display_name(), e);
            return Err(e);
        }

        let services = client.service_names();

        info!("Stopping {} services...", client.display_name());
        self.services.stop(&services)?;

        info!("Updating {} binary in {}...", client.display_name(), install_dir.display());
        if let Err(e) = self.extractor.extract(&archive_path, install_dir) {
            error!("Extraction failed, bringing the previous binary back up: {}", e);
            if let Err(start_err) = self.services.start(&services) {
                error!("Could not start services again: {}", start_err);
            }
            return Err(e);
        }

        info!("Starting {} services...", client.display_name());
        self.services.start(&services)
    }
}

fn find_asset<'r>(release: &'r Release, suffix: &str) -> Result<&'r ReleaseAsset, ActionError> {
    release
        .find_asset_with_suffix(suffix)
        .ok_or_else(|| ActionError::MissingAsset {
            tag: release.tag_name.clone(),
            suffix: suffix.to_string(),
        })
}
