// GitHub Releases API Client
//
// Fetches the latest stable release of a client's upstream repository and
// downloads its assets for binary upgrades.

use crate::error::{ActionError, ProbeError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// GitHub release information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// Get version from tag name (strip 'v' prefix)
    pub fn version(&self) -> &str {
        self.tag_name.strip_prefix('v').unwrap_or(&self.tag_name)
    }

    /// Find the asset whose file name ends with `suffix`
    ///
    /// Signature files share the archive's name plus `.asc`, so callers looking
    /// for the archive pass the archive suffix and never see the signature.
    pub fn find_asset_with_suffix(&self, suffix: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name.ends_with(suffix))
    }
}

/// Release feed capability
pub trait ReleaseFeed {
    /// Latest stable release of `repo` (`owner/name`)
    fn latest_release(&self, repo: &str) -> Result<Release, ProbeError>;

    /// Download `url` into `dest`
    fn download(&self, url: &str, dest: &Path) -> Result<(), ActionError>;
}

/// GitHub REST API backend
pub struct GitHubReleaseFeed {
    api_base: String,
    api_version: String,
    client: reqwest::blocking::Client,
}

impl GitHubReleaseFeed {
    pub fn new(
        api_base: impl Into<String>,
        api_version: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("node-steward/{}", crate::VERSION))
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            client,
        })
    }

    fn latest_release_url(&self, repo: &str) -> String {
        format!("{}/repos/{}/releases/latest", self.api_base, repo)
    }
}

impl ReleaseFeed for GitHubReleaseFeed {
    fn latest_release(&self, repo: &str) -> Result<Release, ProbeError> {
        let url = self.latest_release_url(repo);

        let response = self
            .client
            .get(&url)
            .header("Accept", &self.api_version)
            .send()
            .map_err(|e| ProbeError::Connection {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ProbeError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        response.json::<Release>().map_err(|e| ProbeError::Response {
            url,
            message: format!("Failed to parse GitHub release JSON: {}", e),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), ActionError> {
        info!("Downloading {} to {}", url, dest.display());

        let mut response = self.client.get(url).send().map_err(|e| ActionError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(ActionError::Http {
                url: url.to_string(),
                message: format!("status code {}", response.status()),
            });
        }

        let mut file = File::create(dest)?;
        response.copy_to(&mut file).map_err(|e| ActionError::Http {
            url: url.to_string(),
            message: format!("Failed to read download bytes: {}", e),
        })?;

        Ok(())
    }
}
